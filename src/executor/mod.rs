//! Test execution engine
//!
//! Provides signed request execution plus sequential and parallel suite runs.

mod parallel;
mod request;
mod runner;

pub use parallel::ParallelExecutor;
pub use runner::SuiteRunner;
