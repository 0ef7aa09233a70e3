//! Utility modules

mod config;

pub use config::*;
