#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator asked for a run. `profile_id` is the selection at dispatch time.
    StartRequested {
        profile_id: Option<String>,
        keyword: String,
        analyze: bool,
    },
    /// Generation stage returned an artifact.
    ArtifactGenerated(crate::GeneratedArtifact),
    /// Server-side posting refresh acknowledged.
    PostingsSearched,
    /// Fit analysis returned. The payload is opaque and stays with the caller.
    FitAnalyzed,
    /// The remote call for the current stage failed.
    StageFailed(crate::ApiError),
    /// Return a finished run to `NotStarted`; ignored while a run is active.
    Reset,
}
