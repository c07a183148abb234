//! Data models for webhook testing
//!
//! This module contains the suite definition and the records produced by a run.

#![allow(dead_code)]

mod outcome;
mod suite;

pub use outcome::{
    CaseReport, DeliveryCheck, ExecutionOutcome, ReportEntry, ReportStatus, RunSummary,
};
#[cfg(test)]
pub use outcome::PASSED_MESSAGE;
pub use suite::{Credentials, TestCase, TestSuite, DEFAULT_SIGNATURE_HEADER};
