//! Configuration for the folder manager.

/// Configuration for [`EntityFolders`](crate::EntityFolders).
///
/// Controls default names and how folder IDs are generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldersConfig {
    /// Name given to partition root folders.
    pub root_name: String,

    /// Name given to folders created with `emplace_folder`.
    pub default_folder_name: String,

    /// Seed for folder ID generation. `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            root_name: "root".to_string(),
            default_folder_name: "Folder".to_string(),
            seed: None,
        }
    }
}

impl FoldersConfig {
    /// Creates a configuration that generates the same folder IDs every run.
    #[must_use]
    pub fn deterministic(seed: u64) -> Self {
        Self::default().with_seed(seed)
    }

    /// Builder method to set the root folder name.
    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Builder method to set the default folder name.
    #[must_use]
    pub fn with_default_folder_name(mut self, name: impl Into<String>) -> Self {
        self.default_folder_name = name.into();
        self
    }

    /// Builder method to set the ID seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
