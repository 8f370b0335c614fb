//=========================================================================
// Keystroke Tracker
//=========================================================================
//
// Checks that a stream of key events follows the ordering the engine
// expects for a press: raw-down/down, then any chars, then up.
//
// Architecture:
//   KeyEvent → observe() → HashSet (keys held) → Ok / KeyOrderViolation
//
// Observation only. The bridge logs violations and still forwards every
// event in call order.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::HashSet;
use std::fmt;

//=== Internal Dependencies ===============================================

use super::event::{KeyEvent, KeyEventType, Modifiers};

//=== KeyOrderViolation ===================================================

/// A key event that arrived out of the expected order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrderViolation {
    /// `Char` with no key held down.
    CharWithoutPress { character: u32 },

    /// `Up` for a key that was never pressed.
    ReleaseWithoutPress { native_key_code: u32 },

    /// A second press for a held key without the repeat flag.
    RepeatedPress { native_key_code: u32 },
}

impl fmt::Display for KeyOrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CharWithoutPress { character } => {
                write!(f, "char U+{:04X} without a held key", character)
            }
            Self::ReleaseWithoutPress { native_key_code } => {
                write!(f, "release of key {:#x} that was not pressed", native_key_code)
            }
            Self::RepeatedPress { native_key_code } => {
                write!(f, "key {:#x} pressed twice without repeat flag", native_key_code)
            }
        }
    }
}

//=== KeystrokeTracker ====================================================

/// Tracks which native key codes are held to validate event ordering.
#[derive(Debug, Default)]
pub struct KeystrokeTracker {
    keys_down: HashSet<u32>,
}

impl KeystrokeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `event` and reports whether it fits the expected order.
    ///
    /// State is updated even when a violation is reported, so one stray
    /// event does not poison the rest of the stream.
    pub fn observe(&mut self, event: &KeyEvent) -> Result<(), KeyOrderViolation> {
        let code = event.native_key_code;

        match event.kind {
            KeyEventType::RawDown | KeyEventType::Down => {
                let newly_down = self.keys_down.insert(code);
                // RawDown followed by Down for the same key is one press
                if !newly_down
                    && event.kind == KeyEventType::RawDown
                    && !event.modifiers.contains(Modifiers::IS_REPEAT)
                {
                    return Err(KeyOrderViolation::RepeatedPress {
                        native_key_code: code,
                    });
                }
                Ok(())
            }

            KeyEventType::Char => {
                if self.keys_down.is_empty() {
                    return Err(KeyOrderViolation::CharWithoutPress {
                        character: event.character,
                    });
                }
                Ok(())
            }

            KeyEventType::Up => {
                if !self.keys_down.remove(&code) {
                    return Err(KeyOrderViolation::ReleaseWithoutPress {
                        native_key_code: code,
                    });
                }
                Ok(())
            }
        }
    }

    /// Returns `true` while `native_key_code` is held.
    pub fn is_held(&self, native_key_code: u32) -> bool {
        self.keys_down.contains(&native_key_code)
    }

    /// Number of keys currently held.
    pub fn held_count(&self) -> usize {
        self.keys_down.len()
    }

    /// Forgets all held keys (e.g. on focus loss).
    pub fn reset(&mut self) {
        self.keys_down.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
