//! Case name to test-management id resolution

use std::collections::HashMap;

/// Resolves a test case name to its external case id
pub trait CaseIdLookup: Send + Sync {
    fn case_id(&self, name: &str) -> Option<u64>;
}

impl CaseIdLookup for HashMap<String, u64> {
    fn case_id(&self, name: &str) -> Option<u64> {
        self.get(name).copied()
    }
}

/// Lookup that knows no cases; nothing is reported externally
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCaseIds;

impl CaseIdLookup for NoCaseIds {
    fn case_id(&self, _name: &str) -> Option<u64> {
        None
    }
}
