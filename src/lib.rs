//! Puppet Control: an on-screen character driven by spoken commands or hand
//! gestures.
//!
//! ```text
//!            ┌────────────── ModeController ──────────────┐
//!            │ owns at most one worker, joins it on exit   │
//!            ▼                                             ▼
//!   VoiceWorker (mic → recognizer → command)    GestureWorker (camera → landmarks)
//!            │                                             │
//!            └──────────▶ SharedCharacter ◀────────────────┘
//!                               │ snapshot per tick
//!                               ▼
//!                          PuppetApp (eframe)
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod controller;
pub mod feedback;
pub mod gesture;
pub mod state;
pub mod stt;
pub mod ui;
pub mod voice;
