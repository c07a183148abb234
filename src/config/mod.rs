//! Configuration module
//!
//! Loads suite definitions and environment-provided credentials.

#![allow(dead_code)]

mod env;
mod file;

pub use env::{EnvConfig, QaseCredentials};
pub use file::{find_suite, load_suite, ConfigError};
