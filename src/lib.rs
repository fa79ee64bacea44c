pub mod api;
pub mod core;
pub mod services;

pub use crate::core::config::Config;
pub use crate::core::error::{LibraryError, LibraryResult};
pub use crate::services::ScriptLibrary;
