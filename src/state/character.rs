//! Character position / animation record and the viewport it lives in.
//!
//! [`CharacterState`] is the only value shared between the active input
//! worker and the render loop.  Workers write it through
//! [`SharedCharacter::update`]; the render loop copies it out once per tick
//! with [`SharedCharacter::snapshot`].  The mutex keeps the
//! `(x, y, is_animating)` triple from ever being observed half-written.

use std::sync::{Arc, Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Pixel coordinates of the sprite centre inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Canvas dimensions plus the sprite size used for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    pub sprite_width: i32,
    pub sprite_height: i32,
}

impl Viewport {
    pub const fn new(width: i32, height: i32, sprite_width: i32, sprite_height: i32) -> Self {
        Self {
            width,
            height,
            sprite_width,
            sprite_height,
        }
    }

    /// Centre of the canvas, the start position of the character.
    pub fn center(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    /// Clamp to `[0, width - sprite_width] × [0, height - sprite_height]`.
    ///
    /// Used by relative (voice) movement so the sprite never walks off the
    /// right or bottom edge.
    pub fn clamp_to_sprite_area(&self, p: Position) -> Position {
        let max_x = (self.width - self.sprite_width).max(0);
        let max_y = (self.height - self.sprite_height).max(0);
        Position::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
    }

    /// Clamp to `[0, width] × [0, height]`.
    ///
    /// Used by absolute (gesture) positioning.
    pub fn clamp_to_bounds(&self, p: Position) -> Position {
        Position::new(p.x.clamp(0, self.width), p.y.clamp(0, self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 600, 80, 80)
    }
}

// ---------------------------------------------------------------------------
// CharacterState
// ---------------------------------------------------------------------------

/// The latest position and animation flag.  Last writer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterState {
    pub position: Position,
    pub is_animating: bool,
}

impl CharacterState {
    /// Centred, not dancing.
    pub fn new(viewport: &Viewport) -> Self {
        Self {
            position: viewport.center(),
            is_animating: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedCharacter
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`CharacterState`].
///
/// Cheap to clone.  A poisoned lock is recovered rather than propagated: the
/// state is plain data and every write leaves it consistent.
#[derive(Debug, Clone)]
pub struct SharedCharacter(Arc<Mutex<CharacterState>>);

impl SharedCharacter {
    pub fn new(initial: CharacterState) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> CharacterState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the state under the lock and return whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut CharacterState) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_viewport_is_800_by_600_with_80px_sprite() {
        let vp = Viewport::default();
        assert_eq!((vp.width, vp.height), (800, 600));
        assert_eq!((vp.sprite_width, vp.sprite_height), (80, 80));
    }

    #[test]
    fn initial_state_is_centred_and_idle() {
        let state = CharacterState::new(&Viewport::default());
        assert_eq!(state.position, Position::new(400, 300));
        assert!(!state.is_animating);
    }

    #[test]
    fn sprite_area_clamp_respects_sprite_size() {
        let vp = Viewport::default();
        assert_eq!(
            vp.clamp_to_sprite_area(Position::new(-5, 900)),
            Position::new(0, 520)
        );
        assert_eq!(
            vp.clamp_to_sprite_area(Position::new(790, 10)),
            Position::new(720, 10)
        );
    }

    #[test]
    fn bounds_clamp_allows_full_canvas() {
        let vp = Viewport::default();
        assert_eq!(
            vp.clamp_to_bounds(Position::new(810, -1)),
            Position::new(800, 0)
        );
    }

    #[test]
    fn sprite_larger_than_canvas_clamps_to_origin() {
        let vp = Viewport::new(50, 50, 80, 80);
        assert_eq!(
            vp.clamp_to_sprite_area(Position::new(30, 30)),
            Position::new(0, 0)
        );
    }

    #[test]
    fn shared_character_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedCharacter>();
    }

    #[test]
    fn clones_observe_updates() {
        let shared = SharedCharacter::new(CharacterState::new(&Viewport::default()));
        let other = shared.clone();

        shared.update(|s| {
            s.position = Position::new(1, 2);
            s.is_animating = true;
        });

        let seen = other.snapshot();
        assert_eq!(seen.position, Position::new(1, 2));
        assert!(seen.is_animating);
    }
}
