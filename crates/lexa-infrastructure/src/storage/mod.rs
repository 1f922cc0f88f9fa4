//! Local persistence: configuration and downloaded artifacts.

pub mod artifact_store;
pub mod config_storage;

pub use artifact_store::FsArtifactStore;
pub use config_storage::ConfigStorage;
