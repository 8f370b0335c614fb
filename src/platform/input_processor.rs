//=========================================================================
// Input Processor
//=========================================================================
//
// Converts Winit window events into bridge input events.
//
// Architecture:
//   Winit Events → InputProcessor → KeyEvent / Mouse*Event → Browser
//
// Stateful tracking:
// - modifiers: cached from ModifiersChanged, applied to every event
// - mouse buttons: held buttons are added to the modifier bits
// - cursor: last logical position, reused for clicks, wheel and leave
// - clicks: consecutive presses of one button close in time and space
//   raise `click_count` (capped at 3)
//
// Positions arrive in physical pixels and leave in logical view
// coordinates. Keys without a native code mapping are filtered out.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::time::{Duration, Instant};

//=== External Dependencies ===============================================

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent as WinitKeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta},
    keyboard::{KeyCode as WinitKeyCode, ModifiersState, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::{
    KeyEvent, KeyEventType, Modifiers, MouseButton, MouseClickEvent, MouseMoveEvent,
    MouseWheelEvent,
};

//=== Constants ===========================================================

/// Wheel distance of one line, in logical pixels.
pub(crate) const WHEEL_LINE_PIXELS: f32 = 40.0;

const MULTI_CLICK_INTERVAL: Duration = Duration::from_millis(500);
const MULTI_CLICK_SLOP: i32 = 4;
const MAX_CLICK_COUNT: i32 = 3;

//=== ClickTracker ========================================================

#[derive(Debug, Clone, Copy)]
struct LastClick {
    button: MouseButton,
    position: (i32, i32),
    at: Instant,
    count: i32,
}

//=== InputProcessor ======================================================

/// Converts Winit events to bridge input events with stateful tracking.
pub(crate) struct InputProcessor {
    current_modifiers: Modifiers,
    held_buttons: Modifiers,
    scale_factor: f64,
    cursor: (i32, i32),
    last_click: Option<LastClick>,
}

impl InputProcessor {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(scale_factor: f64) -> Self {
        Self {
            current_modifiers: Modifiers::NONE,
            held_buttons: Modifiers::NONE,
            scale_factor: sanitize_scale(scale_factor),
            cursor: (0, 0),
            last_click: None,
        }
    }

    //--- State Management -------------------------------------------------

    /// Updates cached modifier state (applied to subsequent events).
    pub(crate) fn update_modifiers(&mut self, modifiers_state: ModifiersState) {
        self.current_modifiers = Modifiers::from(modifiers_state);
    }

    /// Keyboard modifiers plus held mouse buttons.
    pub(crate) fn current_modifiers(&self) -> Modifiers {
        self.current_modifiers | self.held_buttons
    }

    pub(crate) fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = sanitize_scale(scale_factor);
    }

    pub(crate) fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Forgets held buttons and click history (e.g. on focus loss).
    pub(crate) fn reset(&mut self) {
        self.held_buttons = Modifiers::NONE;
        self.last_click = None;
    }

    //--- Keyboard ---------------------------------------------------------

    /// Converts a Winit key event into the bridge key sequence.
    pub(crate) fn process_key_event(&self, key_event: &WinitKeyEvent) -> Vec<KeyEvent> {
        self.process_key(
            key_event.physical_key,
            key_event.state,
            key_event.repeat,
            key_event.text.as_deref(),
        )
    }

    /// Press: `RawDown` then one `Char` per produced character.
    /// Release: `Up`. Unmapped keys produce nothing.
    pub(crate) fn process_key(
        &self,
        physical_key: PhysicalKey,
        state: ElementState,
        repeat: bool,
        text: Option<&str>,
    ) -> Vec<KeyEvent> {
        let PhysicalKey::Code(code) = physical_key else {
            return Vec::new();
        };
        let Some(native_key_code) = native_key_code(code) else {
            return Vec::new();
        };

        let mut modifiers = self.current_modifiers();
        if repeat {
            modifiers |= Modifiers::IS_REPEAT;
        }
        let first_char = text.and_then(|t| t.chars().next());

        match state {
            ElementState::Pressed => {
                let mut press = KeyEvent::new(KeyEventType::RawDown, native_key_code, modifiers);
                if let Some(ch) = first_char {
                    press = press.with_characters(ch, ch);
                }

                let mut events = vec![press];
                events.extend(text.unwrap_or_default().chars().filter(|c| !c.is_control()).map(|ch| {
                    KeyEvent::new(KeyEventType::Char, native_key_code, modifiers).with_characters(ch, ch)
                }));
                events
            }
            ElementState::Released => {
                let mut release = KeyEvent::new(KeyEventType::Up, native_key_code, modifiers);
                if let Some(ch) = first_char {
                    release = release.with_characters(ch, ch);
                }
                vec![release]
            }
        }
    }

    //--- Mouse ------------------------------------------------------------

    /// Cursor moved, in physical window pixels.
    pub(crate) fn process_cursor_moved(&mut self, position: PhysicalPosition<f64>) -> MouseMoveEvent {
        self.cursor = self.to_logical(position);
        MouseMoveEvent {
            x: self.cursor.0,
            y: self.cursor.1,
            modifiers: self.current_modifiers(),
            mouse_leave: false,
        }
    }

    /// Cursor left the window, reported at the last known position.
    pub(crate) fn process_cursor_left(&self) -> MouseMoveEvent {
        MouseMoveEvent {
            x: self.cursor.0,
            y: self.cursor.1,
            modifiers: self.current_modifiers(),
            mouse_leave: true,
        }
    }

    /// Button press or release at the cursor. Back/forward and other
    /// buttons are filtered.
    pub(crate) fn process_mouse_button(
        &mut self,
        button: WinitMouseButton,
        state: ElementState,
        now: Instant,
    ) -> Option<MouseClickEvent> {
        let button = map_mouse_button(button)?;
        let flag = button_flag(button);

        let click_count = match state {
            ElementState::Pressed => {
                self.held_buttons |= flag;
                self.register_press(button, now)
            }
            ElementState::Released => {
                self.held_buttons.remove(flag);
                self.last_click.map_or(1, |c| c.count)
            }
        };

        Some(MouseClickEvent {
            x: self.cursor.0,
            y: self.cursor.1,
            modifiers: self.current_modifiers(),
            button,
            mouse_up: state == ElementState::Released,
            click_count,
        })
    }

    /// Wheel motion. Line deltas become `WHEEL_LINE_PIXELS` per line.
    pub(crate) fn process_mouse_wheel(&self, delta: MouseScrollDelta) -> MouseWheelEvent {
        let (delta_x, delta_y) = match delta {
            MouseScrollDelta::LineDelta(x, y) => (
                (x * WHEEL_LINE_PIXELS).round() as i32,
                (y * WHEEL_LINE_PIXELS).round() as i32,
            ),
            MouseScrollDelta::PixelDelta(pos) => (
                (pos.x / self.scale_factor).round() as i32,
                (pos.y / self.scale_factor).round() as i32,
            ),
        };

        MouseWheelEvent {
            x: self.cursor.0,
            y: self.cursor.1,
            modifiers: self.current_modifiers(),
            delta_x,
            delta_y,
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn to_logical(&self, position: PhysicalPosition<f64>) -> (i32, i32) {
        (
            (position.x / self.scale_factor).floor() as i32,
            (position.y / self.scale_factor).floor() as i32,
        )
    }

    fn register_press(&mut self, button: MouseButton, now: Instant) -> i32 {
        let continues = self.last_click.is_some_and(|last| {
            last.button == button
                && now.saturating_duration_since(last.at) <= MULTI_CLICK_INTERVAL
                && (last.position.0 - self.cursor.0).abs() <= MULTI_CLICK_SLOP
                && (last.position.1 - self.cursor.1).abs() <= MULTI_CLICK_SLOP
        });

        let count = match (continues, self.last_click) {
            (true, Some(last)) => (last.count % MAX_CLICK_COUNT) + 1,
            _ => 1,
        };

        self.last_click = Some(LastClick {
            button,
            position: self.cursor,
            at: now,
            count,
        });
        count
    }
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Converts Winit ModifiersState to bridge Modifiers.
///
/// The Super key (Cmd on macOS, Windows key elsewhere) maps to `COMMAND`.
impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        let mut modifiers = Modifiers::NONE;
        modifiers.set(Modifiers::SHIFT, state.shift_key());
        modifiers.set(Modifiers::CONTROL, state.control_key());
        modifiers.set(Modifiers::ALT, state.alt_key());
        modifiers.set(Modifiers::COMMAND, state.super_key());
        modifiers
    }
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

fn button_flag(button: MouseButton) -> Modifiers {
    match button {
        MouseButton::Left => Modifiers::LEFT_MOUSE_BUTTON,
        MouseButton::Middle => Modifiers::MIDDLE_MOUSE_BUTTON,
        MouseButton::Right => Modifiers::RIGHT_MOUSE_BUTTON,
    }
}

/// Maps Winit physical keys to Windows-style virtual key codes, the codes
/// the engine accepts as `native_key_code` on every platform.
///
/// Covers digits, letters, arrows, function keys F1-F12 and common editing
/// keys. Anything else returns `None` and is not forwarded.
fn native_key_code(code: WinitKeyCode) -> Option<u32> {
    use WinitKeyCode::*;
    let vk = match code {
        //--- Digits -------------------------------------------------------

        Digit0 => 0x30,
        Digit1 => 0x31,
        Digit2 => 0x32,
        Digit3 => 0x33,
        Digit4 => 0x34,
        Digit5 => 0x35,
        Digit6 => 0x36,
        Digit7 => 0x37,
        Digit8 => 0x38,
        Digit9 => 0x39,

        //--- Letters ------------------------------------------------------

        KeyA => 0x41,
        KeyB => 0x42,
        KeyC => 0x43,
        KeyD => 0x44,
        KeyE => 0x45,
        KeyF => 0x46,
        KeyG => 0x47,
        KeyH => 0x48,
        KeyI => 0x49,
        KeyJ => 0x4A,
        KeyK => 0x4B,
        KeyL => 0x4C,
        KeyM => 0x4D,
        KeyN => 0x4E,
        KeyO => 0x4F,
        KeyP => 0x50,
        KeyQ => 0x51,
        KeyR => 0x52,
        KeyS => 0x53,
        KeyT => 0x54,
        KeyU => 0x55,
        KeyV => 0x56,
        KeyW => 0x57,
        KeyX => 0x58,
        KeyY => 0x59,
        KeyZ => 0x5A,

        //--- Arrows -------------------------------------------------------

        ArrowLeft => 0x25,
        ArrowUp => 0x26,
        ArrowRight => 0x27,
        ArrowDown => 0x28,

        //--- Function Keys ------------------------------------------------

        F1 => 0x70,
        F2 => 0x71,
        F3 => 0x72,
        F4 => 0x73,
        F5 => 0x74,
        F6 => 0x75,
        F7 => 0x76,
        F8 => 0x77,
        F9 => 0x78,
        F10 => 0x79,
        F11 => 0x7A,
        F12 => 0x7B,

        //--- Editing & Navigation -----------------------------------------

        Backspace => 0x08,
        Tab => 0x09,
        Enter => 0x0D,
        Escape => 0x1B,
        Space => 0x20,
        PageUp => 0x21,
        PageDown => 0x22,
        End => 0x23,
        Home => 0x24,
        Insert => 0x2D,
        Delete => 0x2E,

        //--- Punctuation --------------------------------------------------

        Semicolon => 0xBA,
        Equal => 0xBB,
        Comma => 0xBC,
        Minus => 0xBD,
        Period => 0xBE,
        Slash => 0xBF,
        Backquote => 0xC0,
        BracketLeft => 0xDB,
        Backslash => 0xDC,
        BracketRight => 0xDD,
        Quote => 0xDE,

        //--- Modifiers ----------------------------------------------------

        ShiftLeft | ShiftRight => 0x10,
        ControlLeft | ControlRight => 0x11,
        AltLeft | AltRight => 0x12,
        SuperLeft => 0x5B,
        SuperRight => 0x5C,

        //--- Unmapped -----------------------------------------------------

        _ => return None,
    };
    Some(vk)
}

//=========================================================================
// Tests
//=========================================================================
