//=========================================================================
// Input Event Descriptors
//
// Value types describing one key or mouse event as handed to the
// embedded engine. They mirror the C surface one-to-one: the bridge
// performs no key-code translation and no coordinate mapping.
//
// Responsibilities:
// - Represent key event types and mouse buttons with their wire values
// - Carry the engine's modifier flag bit set unchanged
// - Convert raw C integers into typed values, rejecting unknown codes
//
// Design:
// Every descriptor is `Copy` and passed by value per call. Nothing here
// keeps state between events.
//
// Event Flow:
// ```text
// Host (C / Rust / winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    Browser::send_*  →  EngineBrowser
// ```
//
//=========================================================================

//=== External Crates =====================================================

use bitflags::bitflags;

//=== Internal Imports ====================================================

use crate::error::BridgeError;

//=== KeyEventType ========================================================

/// Kind of key event, with the values used on the C surface.
///
/// For printable input the engine expects `RawDown` (or `Down`) before
/// `Char`, and `Up` terminating the press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyEventType {
    /// Key pressed, before any character translation.
    RawDown = 0,

    /// Key pressed, after translation.
    Down = 1,

    /// Key released.
    Up = 2,

    /// Character produced by a key press.
    Char = 3,
}

impl KeyEventType {
    /// Returns `true` for the two press variants.
    pub fn is_press(self) -> bool {
        matches!(self, Self::RawDown | Self::Down)
    }
}

impl TryFrom<i32> for KeyEventType {
    type Error = BridgeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::RawDown),
            1 => Ok(Self::Down),
            2 => Ok(Self::Up),
            3 => Ok(Self::Char),
            other => Err(BridgeError::invalid_argument(format!(
                "unknown key event type {}",
                other
            ))),
        }
    }
}

//=== MouseButton =========================================================

/// Physical mouse button, with the values used on the C surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MouseButton {
    /// Primary button.
    Left = 0,

    /// Wheel click.
    Middle = 1,

    /// Secondary button.
    Right = 2,
}

impl TryFrom<i32> for MouseButton {
    type Error = BridgeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Middle),
            2 => Ok(Self::Right),
            other => Err(BridgeError::invalid_argument(format!(
                "unknown mouse button {}",
                other
            ))),
        }
    }
}

//=== Modifiers ===========================================================

bitflags! {
    /// Modifier and button state accompanying an input event.
    ///
    /// Bit values follow the embedded engine's event flags. Bits the
    /// bridge does not name are kept as-is and forwarded untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const CAPS_LOCK = 1 << 0;
        const SHIFT = 1 << 1;
        const CONTROL = 1 << 2;
        const ALT = 1 << 3;
        const LEFT_MOUSE_BUTTON = 1 << 4;
        const MIDDLE_MOUSE_BUTTON = 1 << 5;
        const RIGHT_MOUSE_BUTTON = 1 << 6;
        /// Command on macOS.
        const COMMAND = 1 << 7;
        const NUM_LOCK = 1 << 8;
        const IS_KEY_PAD = 1 << 9;
        const IS_LEFT = 1 << 10;
        const IS_RIGHT = 1 << 11;
        const ALTGR = 1 << 12;
        const IS_REPEAT = 1 << 13;
    }
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self::empty();

    /// Builds a modifier set from the raw C integer, keeping unknown bits.
    pub fn from_raw(raw: i32) -> Self {
        Self::from_bits_retain(raw as u32)
    }

    /// Returns the raw bit pattern as passed over the C surface.
    pub fn to_raw(self) -> i32 {
        self.bits() as i32
    }
}

//=== KeyEvent ============================================================

/// One keyboard event.
///
/// `character` and `unmodified_character` are UTF-32 code units (0 when
/// not applicable); `native_key_code` is the platform key code, passed
/// through untranslated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub kind: KeyEventType,
    pub modifiers: Modifiers,
    pub character: u32,
    pub unmodified_character: u32,
    pub native_key_code: u32,
}

impl KeyEvent {
    /// Creates an event of the given kind without character payload.
    pub fn new(kind: KeyEventType, native_key_code: u32, modifiers: Modifiers) -> Self {
        Self {
            kind,
            modifiers,
            character: 0,
            unmodified_character: 0,
            native_key_code,
        }
    }

    /// Returns a copy carrying the given characters.
    pub fn with_characters(mut self, character: char, unmodified_character: char) -> Self {
        self.character = character as u32;
        self.unmodified_character = unmodified_character as u32;
        self
    }

    /// Returns the character payload, if it is a valid scalar value.
    pub fn char(&self) -> Option<char> {
        match self.character {
            0 => None,
            code => char::from_u32(code),
        }
    }

    /// Builds the full press sequence for a printable character:
    /// `RawDown`, `Char`, `Up`.
    pub fn keystroke(native_key_code: u32, character: char, modifiers: Modifiers) -> [KeyEvent; 3] {
        let press = Self::new(KeyEventType::RawDown, native_key_code, modifiers)
            .with_characters(character, character);
        let typed = Self::new(KeyEventType::Char, native_key_code, modifiers)
            .with_characters(character, character);
        let release = Self::new(KeyEventType::Up, native_key_code, modifiers)
            .with_characters(character, character);
        [press, typed, release]
    }
}

//=== Mouse Events ========================================================

/// Cursor moved, or left the view when `mouse_leave` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseMoveEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
    pub mouse_leave: bool,
}

/// Button press or release. `click_count` carries double/triple-click
/// state as counted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseClickEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
    pub button: MouseButton,
    pub mouse_up: bool,
    pub click_count: i32,
}

/// Scroll by `delta_x`/`delta_y` in engine-native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseWheelEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
    pub delta_x: i32,
    pub delta_y: i32,
}

//=== InputEvent ==========================================================

/// Any event that can be injected into a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Key(KeyEvent),
    MouseMove(MouseMoveEvent),
    MouseClick(MouseClickEvent),
    MouseWheel(MouseWheelEvent),
}

impl InputEvent {
    /// Modifier state of the wrapped event.
    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::Key(e) => e.modifiers,
            Self::MouseMove(e) => e.modifiers,
            Self::MouseClick(e) => e.modifiers,
            Self::MouseWheel(e) => e.modifiers,
        }
    }

    /// Pointer position for mouse events.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self {
            Self::Key(_) => None,
            Self::MouseMove(e) => Some((e.x, e.y)),
            Self::MouseClick(e) => Some((e.x, e.y)),
            Self::MouseWheel(e) => Some((e.x, e.y)),
        }
    }
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        Self::Key(event)
    }
}

impl From<MouseMoveEvent> for InputEvent {
    fn from(event: MouseMoveEvent) -> Self {
        Self::MouseMove(event)
    }
}

impl From<MouseClickEvent> for InputEvent {
    fn from(event: MouseClickEvent) -> Self {
        Self::MouseClick(event)
    }
}

impl From<MouseWheelEvent> for InputEvent {
    fn from(event: MouseWheelEvent) -> Self {
        Self::MouseWheel(event)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //=====================================================================
    // Wire Value Tests
    //=====================================================================

    #[test]
    fn key_event_type_wire_values() {
        assert_eq!(KeyEventType::RawDown as i32, 0);
        assert_eq!(KeyEventType::Down as i32, 1);
        assert_eq!(KeyEventType::Up as i32, 2);
        assert_eq!(KeyEventType::Char as i32, 3);
    }

    #[test]
    fn key_event_type_parses_known_values() {
        for raw in 0..4 {
            let kind = KeyEventType::try_from(raw).unwrap();
            assert_eq!(kind as i32, raw);
        }
    }

    #[test]
    fn key_event_type_rejects_unknown_values() {
        assert!(KeyEventType::try_from(4).is_err());
        assert!(KeyEventType::try_from(-1).is_err());
    }

    #[test]
    fn mouse_button_wire_values() {
        assert_eq!(MouseButton::try_from(0).unwrap(), MouseButton::Left);
        assert_eq!(MouseButton::try_from(1).unwrap(), MouseButton::Middle);
        assert_eq!(MouseButton::try_from(2).unwrap(), MouseButton::Right);
        assert!(MouseButton::try_from(3).is_err());
    }

    //=====================================================================
    // Modifier Tests
    //=====================================================================

    #[test]
    fn modifiers_keep_unknown_bits() {
        let raw = (1 << 1) | (1 << 20);
        let mods = Modifiers::from_raw(raw);
        assert!(mods.contains(Modifiers::SHIFT));
        assert_eq!(mods.to_raw(), raw, "Unknown bits must pass through");
    }

    #[test]
    fn modifiers_default_is_none() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert_eq!(Modifiers::NONE.to_raw(), 0);
    }

    //=====================================================================
    // KeyEvent Tests
    //=====================================================================

    #[test]
    fn keystroke_orders_press_char_release() {
        let [press, typed, release] = KeyEvent::keystroke(0x41, 'a', Modifiers::NONE);
        assert_eq!(press.kind, KeyEventType::RawDown);
        assert_eq!(typed.kind, KeyEventType::Char);
        assert_eq!(release.kind, KeyEventType::Up);
        assert_eq!(typed.char(), Some('a'));
    }

    #[test]
    fn char_ignores_zero_and_invalid_codes() {
        let mut event = KeyEvent::new(KeyEventType::Char, 0, Modifiers::NONE);
        assert_eq!(event.char(), None);
        event.character = 0xD800;
        assert_eq!(event.char(), None, "Surrogates are not chars");
    }

    #[test]
    fn input_event_position_only_for_mouse() {
        let key: InputEvent = KeyEvent::new(KeyEventType::Down, 1, Modifiers::NONE).into();
        assert_eq!(key.position(), None);

        let wheel: InputEvent = MouseWheelEvent {
            x: 3,
            y: 4,
            modifiers: Modifiers::CONTROL,
            delta_x: 0,
            delta_y: -120,
        }
        .into();
        assert_eq!(wheel.position(), Some((3, 4)));
        assert_eq!(wheel.modifiers(), Modifiers::CONTROL);
    }
}
