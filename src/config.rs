//! Ambient runtime knobs a host binds before driving the core, grounded on
//! `server/src/server/server_config.rs`'s `ServerConfig`. The excluded
//! transport/scheduler/location-manager collaborators own their own
//! configuration; this struct only carries the values the core itself
//! reads (spec: "parameterized by the surrounding runtime").

/// Node-count and default-behavior knobs read by the construction,
/// migration, and checkpoint paths. Per-collection overrides (e.g. a
/// single collection opting out of `keep_last_elm_on_migrate`) are carried
/// on [`crate::registry::MetaCollection`] instead; this struct only seeds
/// the defaults a host applies when it doesn't otherwise care.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Size of the fixed node set this runtime instance runs across.
    pub num_nodes: crate::types::NodeId,
    /// Default for [`crate::construct::ConstructionConfig::keep_last_elm_on_migrate`]
    /// when a collection doesn't set it explicitly.
    pub keep_last_elm_on_migrate_default: bool,
    /// Default bucket size for [`crate::checkpoint::checkpoint_to_file`]'s
    /// `files_per_directory` when a caller doesn't override it.
    pub checkpoint_files_per_directory: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            num_nodes: 1,
            keep_last_elm_on_migrate_default: false,
            checkpoint_files_per_directory: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_single_node_runtime() {
        let config = RuntimeConfig::default();
        assert_eq!(config.num_nodes, 1);
        assert!(!config.keep_last_elm_on_migrate_default);
    }
}
