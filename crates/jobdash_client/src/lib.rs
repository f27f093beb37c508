//! Jobdash client: remote access, resource cache, selection and the
//! generate/search/analyze pipeline.
mod backend;
mod cache;
mod dashboard;
mod http;
mod persist;
mod pipeline;
mod selection;

pub use backend::Backend;
pub use cache::{BackendSource, Entry, ResourceCache, ResourceSource};
pub use dashboard::{Dashboard, RunOutcome};
pub use http::{ClientSettings, HttpBackend, RouteStyle};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use pipeline::{NoProgress, PipelineController, PipelineOutput, PipelineRequest, ProgressSink};
pub use selection::SelectionContext;
