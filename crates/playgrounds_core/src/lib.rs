pub mod config;
pub mod connection;
pub mod error;
pub mod import;
pub mod loader;
pub mod naming;
pub mod reference;
pub mod scaffold;
pub mod snapshot;

pub use error::{ImportError, ImportResult};
