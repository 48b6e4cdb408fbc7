//! Voice command vocabulary and how commands change the character.

use serde::{Deserialize, Serialize};

use crate::state::{CharacterState, Position, Viewport};

// ---------------------------------------------------------------------------
// VoiceCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit offset in screen coordinates (y grows downward).
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    Move(Direction),
    ToggleDance,
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Keywords for each command.  A recognized phrase triggers a command when
/// it contains any of that command's keywords as a substring.
///
/// Defaults are Spanish only.  Short keywords from other languages ("up")
/// occur inside ordinary Spanish words, so add them through `settings.toml`
/// only together with a matching recognizer language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub dance: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| (*w).to_owned()).collect()
        }
        Self {
            up: words(&["arriba"]),
            down: words(&["abajo"]),
            left: words(&["izquierda"]),
            right: words(&["derecha"]),
            dance: words(&["bailar"]),
        }
    }
}

impl Vocabulary {
    /// First command whose keywords occur in `text`, checked in the order
    /// up, down, left, right, dance.  `text` is expected lower-case.
    pub fn parse(&self, text: &str) -> Option<VoiceCommand> {
        let table: [(&[String], VoiceCommand); 5] = [
            (self.up.as_slice(), VoiceCommand::Move(Direction::Up)),
            (self.down.as_slice(), VoiceCommand::Move(Direction::Down)),
            (self.left.as_slice(), VoiceCommand::Move(Direction::Left)),
            (self.right.as_slice(), VoiceCommand::Move(Direction::Right)),
            (self.dance.as_slice(), VoiceCommand::ToggleDance),
        ];

        table
            .into_iter()
            .find(|(keywords, _)| {
                keywords
                    .iter()
                    .any(|k| !k.is_empty() && text.contains(k.to_lowercase().as_str()))
            })
            .map(|(_, cmd)| cmd)
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// What a command did to the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    Moved(Position),
    /// New value of `is_animating`.
    DanceToggled(bool),
}

/// Apply `command` to `state`.
///
/// Moves shift by `step` pixels, clamp to the sprite area and stop any
/// dance.  `ToggleDance` flips `is_animating` and leaves the position alone.
pub fn apply(
    command: VoiceCommand,
    state: &mut CharacterState,
    viewport: &Viewport,
    step: i32,
) -> CommandEffect {
    match command {
        VoiceCommand::Move(direction) => {
            let (dx, dy) = direction.delta();
            let target = Position::new(
                state.position.x.saturating_add(dx * step),
                state.position.y.saturating_add(dy * step),
            );
            state.position = viewport.clamp_to_sprite_area(target);
            state.is_animating = false;
            CommandEffect::Moved(state.position)
        }
        VoiceCommand::ToggleDance => {
            state.is_animating = !state.is_animating;
            CommandEffect::DanceToggled(state.is_animating)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
