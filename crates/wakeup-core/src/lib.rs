pub mod config;
pub mod cycle;
pub mod error;
pub mod model;
pub mod paths;
pub mod slot;
pub mod stats;
pub mod store;

pub use error::{Result, WakeupError};
