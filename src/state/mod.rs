//! Shared runtime state: the character record and the current mode.
//!
//! # Architecture
//!
//! ```text
//! ModeController ──set──▶ ModeCell ◀──get── active worker
//!                                             │
//!                                             ▼ update
//! render loop ◀──snapshot── SharedCharacter (Arc<Mutex<CharacterState>>)
//! ```

pub mod character;
pub mod mode;

pub use character::{CharacterState, Position, SharedCharacter, Viewport};
pub use mode::{Mode, ModeCell};
