use std::fs;
use std::path::Path;

use jobdash_client::AtomicFileWriter;
use jobdash_core::ProfileId;
use jobdash_logging::{jobdash_error, jobdash_info, jobdash_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".jobdash_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    selected_profile: Option<ProfileId>,
}

/// Selection saved by the previous invocation, if any.
pub(crate) fn load_selection(state_dir: &Path) -> Option<ProfileId> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            jobdash_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            jobdash_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    jobdash_info!("Loaded persisted selection from {:?}", path);
    state.selected_profile.filter(|id| !id.trim().is_empty())
}

pub(crate) fn save_selection(state_dir: &Path, selected: Option<&str>) {
    let state = PersistedState {
        selected_profile: selected.map(str::to_string),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            jobdash_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    if let Err(err) = writer.write(STATE_FILENAME, content.as_bytes()) {
        jobdash_error!("Failed to write persisted state to {:?}: {}", state_dir, err);
    }
}
