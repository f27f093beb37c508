use crate::state::{PROGRESS_ANALYZING, PROGRESS_DONE, PROGRESS_SEARCHING};
use crate::{ApiError, Effect, Msg, PipelineRun, RunSnapshot, Stage};

/// Pure update function: applies a message to a run and returns the effects
/// the driver must execute, in order.
pub fn update(mut run: PipelineRun, msg: Msg) -> (PipelineRun, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested {
            profile_id,
            keyword,
            analyze,
        } => match validate_start(&run, profile_id, &keyword) {
            Ok(profile_id) => {
                let keyword = keyword.trim().to_string();
                run.begin(RunSnapshot {
                    profile_id: profile_id.clone(),
                    keyword: keyword.clone(),
                    analyze,
                });
                vec![Effect::GenerateArtifact {
                    profile_id,
                    keyword,
                }]
            }
            Err(err) => vec![Effect::Refused(err)],
        },
        Msg::ArtifactGenerated(artifact) => {
            if run.stage() != Stage::Generating {
                return (run, Vec::new());
            }
            run.set_artifact(artifact);
            run.advance(Stage::Searching, PROGRESS_SEARCHING);
            match run.snapshot() {
                Some(snapshot) => vec![Effect::SearchPostings {
                    profile_id: snapshot.profile_id.clone(),
                    keyword: snapshot.keyword.clone(),
                }],
                None => Vec::new(),
            }
        }
        Msg::PostingsSearched => {
            if run.stage() != Stage::Searching {
                return (run, Vec::new());
            }
            let Some(snapshot) = run.snapshot().cloned() else {
                return (run, Vec::new());
            };
            if snapshot.analyze {
                run.advance(Stage::Analyzing, PROGRESS_ANALYZING);
                vec![
                    Effect::InvalidatePostings,
                    Effect::AnalyzeFit {
                        profile_id: snapshot.profile_id,
                    },
                ]
            } else {
                run.advance(Stage::Done, PROGRESS_DONE);
                vec![Effect::InvalidatePostings, Effect::Finished]
            }
        }
        Msg::FitAnalyzed => {
            if run.stage() != Stage::Analyzing {
                return (run, Vec::new());
            }
            run.advance(Stage::Done, PROGRESS_DONE);
            vec![Effect::Finished]
        }
        Msg::StageFailed(err) => {
            if !run.stage().is_active() {
                return (run, Vec::new());
            }
            run.fail(err.clone());
            vec![Effect::Aborted(err)]
        }
        Msg::Reset => {
            if !run.stage().is_active() {
                run = PipelineRun::new();
            }
            Vec::new()
        }
    };

    (run, effects)
}

fn validate_start(
    run: &PipelineRun,
    profile_id: Option<String>,
    keyword: &str,
) -> Result<String, ApiError> {
    if !run.can_start() {
        return Err(ApiError::precondition(format!(
            "a run is already {}",
            run.stage().label()
        )));
    }
    let profile_id = profile_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::precondition("no profile selected"))?;
    if keyword.trim().is_empty() {
        return Err(ApiError::precondition("target keyword is empty"));
    }
    Ok(profile_id)
}
