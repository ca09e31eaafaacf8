//! Configuration for the dictionary sync daemon.
//!
//! Provides environment detection, layered loading from YAML files and environment variables,
//! secret handling and the configuration types shared by the sync crates.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
