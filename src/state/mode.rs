//! Top-level control mode and the atomic cell workers poll to find out
//! whether they are still wanted.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The currently active control scheme.
///
/// ```text
/// Menu ──select voice───▶ VoiceControl   ──cancel──▶ Menu
/// Menu ──select camera──▶ GestureControl ──cancel──▶ Menu
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Mode {
    /// Option menu; no worker runs.
    #[default]
    Menu = 0,
    /// Speech commands drive the character.
    VoiceControl = 1,
    /// Hand tracking drives the character.
    GestureControl = 2,
}

impl Mode {
    /// Short name shown in the scene overlay ("Modo: VOZ").
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Menu => "MENU",
            Mode::VoiceControl => "VOZ",
            Mode::GestureControl => "CAMARA",
        }
    }

    /// `true` for the modes that own a background worker.
    pub fn has_worker(&self) -> bool {
        !matches!(self, Mode::Menu)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Mode::VoiceControl,
            2 => Mode::GestureControl,
            _ => Mode::Menu,
        }
    }
}

// ---------------------------------------------------------------------------
// ModeCell
// ---------------------------------------------------------------------------

/// Shared, lock-free view of the current [`Mode`].
///
/// The controller is the only writer; workers read it at the top of every
/// iteration.
#[derive(Debug, Clone)]
pub struct ModeCell(Arc<AtomicU8>);

impl ModeCell {
    pub fn new(mode: Mode) -> Self {
        Self(Arc::new(AtomicU8::new(mode as u8)))
    }

    pub fn get(&self) -> Mode {
        Mode::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, mode: Mode) {
        self.0.store(mode as u8, Ordering::Release);
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(Mode::Menu)
    }
}
