pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod loader;
pub mod remote;

pub use config::Config;
pub use error::{Error, Result};
