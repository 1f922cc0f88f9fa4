pub mod http;
pub mod paths;
pub mod storage;

pub use crate::http::{build_http_client, HttpAuthClient, HttpContractBackend};
pub use crate::paths::LexaPaths;
pub use crate::storage::{ConfigStorage, FsArtifactStore};
