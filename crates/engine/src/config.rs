use caseset_config::Settings;
use caseset_core::SelectionPolicy;

/// Per-data-set configuration, passed in explicitly at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSetConfig {
    pub selection: SelectionPolicy,
    /// Log each translated synchronization batch at debug level.
    pub log_sync_translations: bool,
}

impl DataSetConfig {
    pub fn with_cells_select_cases(mut self, enabled: bool) -> Self {
        self.selection.cells_select_cases = enabled;
        self
    }
}

impl From<&Settings> for DataSetConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            selection: SelectionPolicy {
                cells_select_cases: settings.cells_select_cases,
            },
            log_sync_translations: settings.log_sync_translations,
        }
    }
}
