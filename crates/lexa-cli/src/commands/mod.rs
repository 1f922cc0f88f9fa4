pub mod auth;
pub mod download;
pub mod draft;
pub mod templates;
