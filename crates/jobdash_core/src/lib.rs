//! Jobdash core: domain model, error taxonomy, cache bookkeeping and the
//! pipeline state machine. Nothing in here performs I/O.
mod cache_state;
mod effect;
mod error;
mod model;
mod msg;
mod state;
mod update;

pub use cache_state::{
    CacheEntry, CacheKey, CacheSlot, CacheValue, CommitOutcome, EntryStatus, FetchTicket,
    ResourceType,
};
pub use effect::Effect;
pub use error::{require_profile, ApiError, ErrorKind};
pub use model::{
    DocumentContent, DocumentId, DownloadedDocument, GeneratedArtifact, JobPosting, Profile,
    ProfileId, SourceDocument,
};
pub use msg::Msg;
pub use state::{
    PipelineRun, RunSnapshot, Stage, PROGRESS_ANALYZING, PROGRESS_DONE, PROGRESS_GENERATING,
    PROGRESS_SEARCHING,
};
pub use update::update;
