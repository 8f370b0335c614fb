//=========================================================================
// Core Types
//
// Engine-independent building blocks shared by the safe API, the C ABI,
// and every engine implementation.
//
// Responsibilities:
// - Identify browsers (`BrowserId`)
// - Describe input events and validate their ordering (`input`)
// - Move frames from engine threads to host handlers (`paint`)
// - Normalize view geometry (`view`)
// - Hand frames over to a host UI thread (`host_bridge`)
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;

//=== Submodules ==========================================================

pub mod host_bridge;
pub mod input;
pub mod paint;
pub mod view;

//=== BrowserId ===========================================================

/// Process-unique identifier of one browser instance.
///
/// Ids are handed out in increasing order and never reused within a
/// process, so a stale id can never alias a newer browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrowserId(u64);

impl BrowserId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
