use crate::{ApiError, ProfileId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GenerateArtifact {
        profile_id: ProfileId,
        keyword: String,
    },
    SearchPostings {
        profile_id: ProfileId,
        keyword: String,
    },
    AnalyzeFit {
        profile_id: ProfileId,
    },
    /// The shared job-postings collection changed on the server.
    InvalidatePostings,
    /// The run reached `Done`.
    Finished,
    /// The run moved to `Failed`; later stages will not be dispatched.
    Aborted(ApiError),
    /// The start request was refused; state is unchanged.
    Refused(ApiError),
}
