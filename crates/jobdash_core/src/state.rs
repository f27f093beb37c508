use crate::{ApiError, GeneratedArtifact, ProfileId};

pub const PROGRESS_GENERATING: u8 = 20;
pub const PROGRESS_SEARCHING: u8 = 50;
pub const PROGRESS_ANALYZING: u8 = 80;
pub const PROGRESS_DONE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub enum Stage {
    #[default]
    NotStarted,
    Generating,
    Searching,
    Analyzing,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Stage::Generating | Stage::Searching | Stage::Analyzing)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::NotStarted => "not started",
            Stage::Generating => "generating artifact",
            Stage::Searching => "searching postings",
            Stage::Analyzing => "analyzing fit",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

/// Inputs captured when a run starts. Later selection changes never touch them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub profile_id: ProfileId,
    pub keyword: String,
    pub analyze: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineRun {
    stage: Stage,
    progress: u8,
    error: Option<ApiError>,
    failed_at: Option<Stage>,
    snapshot: Option<RunSnapshot>,
    artifact: Option<GeneratedArtifact>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// Stage that was executing when the run failed.
    pub fn failed_at(&self) -> Option<Stage> {
        self.failed_at
    }

    pub fn snapshot(&self) -> Option<&RunSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    pub fn can_start(&self) -> bool {
        matches!(self.stage, Stage::NotStarted | Stage::Done | Stage::Failed)
    }

    pub(crate) fn begin(&mut self, snapshot: RunSnapshot) {
        self.stage = Stage::Generating;
        self.progress = PROGRESS_GENERATING;
        self.error = None;
        self.failed_at = None;
        self.snapshot = Some(snapshot);
        self.artifact = None;
    }

    /// Moves to `next` only if it lies strictly ahead of the current stage.
    pub(crate) fn advance(&mut self, next: Stage, progress: u8) -> bool {
        if next <= self.stage || next == Stage::Failed {
            return false;
        }
        self.stage = next;
        self.progress = progress;
        true
    }

    pub(crate) fn set_artifact(&mut self, artifact: GeneratedArtifact) {
        self.artifact = Some(artifact);
    }

    pub(crate) fn fail(&mut self, error: ApiError) {
        self.failed_at = Some(self.stage);
        self.stage = Stage::Failed;
        self.progress = 0;
        self.error = Some(error);
    }
}
