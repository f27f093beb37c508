use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use jobdash_core::{
    update, ApiError, CacheKey, Effect, GeneratedArtifact, Msg, PipelineRun, ProfileId,
};
use jobdash_logging::{jobdash_info, jobdash_warn};

use crate::{Backend, ResourceCache};

/// Receives every pipeline state transition.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, run: &PipelineRun);
}

/// Sink for callers that only care about the final result.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _run: &PipelineRun) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub keyword: String,
    /// Run the optional fit analysis after the posting refresh.
    pub analyze: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Profile the run was started with, regardless of later selection changes.
    pub profile_id: ProfileId,
    pub keyword: String,
    pub artifact: GeneratedArtifact,
    pub analysis: Option<serde_json::Value>,
}

/// Drives generate -> search -> analyze, one stage at a time.
///
/// Stage logic lives in [`jobdash_core::update`]; this type only executes the
/// effects it returns. It never retries: the first failure ends the run.
pub struct PipelineController {
    backend: Arc<dyn Backend>,
    cache: ResourceCache,
    run: Mutex<PipelineRun>,
}

impl PipelineController {
    pub fn new(backend: Arc<dyn Backend>, cache: ResourceCache) -> Self {
        Self {
            backend,
            cache,
            run: Mutex::new(PipelineRun::new()),
        }
    }

    /// Latest state of the current (or last) run.
    pub fn state(&self) -> PipelineRun {
        self.lock().clone()
    }

    /// Returns a finished run to `NotStarted`. No effect while a run is active.
    pub fn reset(&self) {
        self.apply(Msg::Reset, &NoProgress);
    }

    /// Runs the whole pipeline for `profile_id`, which the caller reads from the
    /// selection at dispatch time. Missing inputs are refused before any
    /// network call.
    pub async fn run(
        &self,
        profile_id: Option<ProfileId>,
        request: PipelineRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PipelineOutput, ApiError> {
        let start = Msg::StartRequested {
            profile_id,
            keyword: request.keyword,
            analyze: request.analyze,
        };
        let mut pending: VecDeque<Effect> = self.apply(start, sink).into();
        let mut analysis = None;

        while let Some(effect) = pending.pop_front() {
            let msg = match effect {
                Effect::GenerateArtifact {
                    profile_id,
                    keyword,
                } => match self.backend.generate_artifact(&profile_id, &keyword).await {
                    Ok(artifact) => Msg::ArtifactGenerated(artifact),
                    Err(err) => Msg::StageFailed(err),
                },
                Effect::SearchPostings {
                    profile_id,
                    keyword,
                } => match self
                    .backend
                    .search_job_postings(&profile_id, Some(&keyword))
                    .await
                {
                    Ok(()) => Msg::PostingsSearched,
                    Err(err) => Msg::StageFailed(err),
                },
                Effect::AnalyzeFit { profile_id } => {
                    match self.backend.analyze_fit(&profile_id).await {
                        Ok(payload) => {
                            analysis = Some(payload);
                            Msg::FitAnalyzed
                        }
                        Err(err) => Msg::StageFailed(err),
                    }
                }
                Effect::InvalidatePostings => {
                    self.cache.invalidate(&CacheKey::postings());
                    continue;
                }
                Effect::Finished => return self.finished_output(analysis),
                Effect::Aborted(err) => {
                    jobdash_warn!("pipeline failed: {}", err);
                    return Err(err);
                }
                Effect::Refused(err) => {
                    jobdash_warn!("pipeline refused to start: {}", err);
                    return Err(err);
                }
            };
            pending.extend(self.apply(msg, sink));
        }

        Err(ApiError::cancelled("pipeline stopped before a terminal stage"))
    }

    fn apply(&self, msg: Msg, sink: &dyn ProgressSink) -> Vec<Effect> {
        let (next, effects, changed) = {
            let mut guard = self.lock();
            let previous = std::mem::take(&mut *guard);
            let (next, effects) = update(previous.clone(), msg);
            let changed = next != previous;
            *guard = next.clone();
            (next, effects, changed)
        };
        if changed {
            jobdash_info!(
                "pipeline {} ({}%)",
                next.stage().label(),
                next.progress_percent()
            );
            sink.emit(&next);
        }
        effects
    }

    fn finished_output(
        &self,
        analysis: Option<serde_json::Value>,
    ) -> Result<PipelineOutput, ApiError> {
        let run = self.state();
        match (run.snapshot(), run.artifact()) {
            (Some(snapshot), Some(artifact)) => Ok(PipelineOutput {
                profile_id: snapshot.profile_id.clone(),
                keyword: snapshot.keyword.clone(),
                artifact: artifact.clone(),
                analysis,
            }),
            _ => Err(ApiError::cancelled("finished run lost its snapshot")),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineRun> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
