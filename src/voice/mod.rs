//! Voice control: spoken keywords move the character or toggle its dance.

pub mod commands;
pub mod worker;

pub use commands::{apply, CommandEffect, Direction, VoiceCommand, Vocabulary};
pub use worker::{IterationOutcome, VoiceSettings, VoiceWorker};
