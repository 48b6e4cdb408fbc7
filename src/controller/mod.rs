//! Mode controller: the state machine that decides which input worker, if
//! any, is allowed to drive the character.
//!
//! # Transitions
//!
//! ```text
//!            ┌────── select voice ──────▶ VoiceControl ──┐
//!            │                                            │ cancel
//!  Menu ─────┤                                            ▼ (stop + join)
//!   ▲        └────── select camera ─────▶ GestureControl ─┘
//!   │                                                     │
//!   └─────────────────────────────────────────────────────┘
//!
//!  Menu ── select exit ──▶ Quit        any ── quit ──▶ Quit (stop + join)
//! ```
//!
//! Every other (mode, event) pair is ignored.  The controller is owned by
//! the UI thread; worker joins block that thread until the worker has
//! finished its current iteration.

pub mod worker;

pub use worker::{WorkerContext, WorkerHandle};

use tokio::runtime::Handle;

use crate::feedback::{phrases, Announcer};
use crate::gesture::GestureWorker;
use crate::state::{Mode, ModeCell, SharedCharacter};
use crate::voice::VoiceWorker;

// ---------------------------------------------------------------------------
// Events / transitions
// ---------------------------------------------------------------------------

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    SelectVoice,
    SelectGesture,
    SelectExit,
    /// Escape key.
    Cancel,
    /// Window closed.
    Quit,
}

/// What [`ModeController::handle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Entered(Mode),
    ReturnedToMenu,
    /// The application should close.
    Quit,
}

// ---------------------------------------------------------------------------
// ModeController
// ---------------------------------------------------------------------------

pub struct ModeController {
    runtime: Handle,
    mode: ModeCell,
    character: SharedCharacter,
    voice: VoiceWorker,
    gesture: GestureWorker,
    announcer: Announcer,
    worker: Option<WorkerHandle>,
}

impl ModeController {
    pub fn new(
        runtime: Handle,
        character: SharedCharacter,
        voice: VoiceWorker,
        gesture: GestureWorker,
        announcer: Announcer,
    ) -> Self {
        Self {
            runtime,
            mode: ModeCell::new(Mode::Menu),
            character,
            voice,
            gesture,
            announcer,
            worker: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn character(&self) -> &SharedCharacter {
        &self.character
    }

    /// `true` while a worker task is still running.
    pub fn worker_active(&self) -> bool {
        self.worker.as_ref().is_some_and(WorkerHandle::is_active)
    }

    /// Apply one event.
    pub fn handle(&mut self, event: ModeEvent) -> Transition {
        let current = self.mode.get();
        match (current, event) {
            (_, ModeEvent::Quit) | (Mode::Menu, ModeEvent::SelectExit) => {
                self.shutdown();
                Transition::Quit
            }
            (Mode::Menu, ModeEvent::SelectVoice) => self.enter_voice(),
            (Mode::Menu, ModeEvent::SelectGesture) => self.enter_gesture(),
            (mode, ModeEvent::Cancel) if mode.has_worker() => {
                self.mode.set(Mode::Menu);
                self.stop_worker();
                log::info!("controller: back to menu");
                Transition::ReturnedToMenu
            }
            (mode, event) => {
                log::debug!("controller: ignoring {event:?} in {mode:?}");
                Transition::Ignored
            }
        }
    }

    /// Stop and join any running worker.  Idempotent.
    pub fn shutdown(&mut self) {
        self.mode.set(Mode::Menu);
        self.stop_worker();
    }

    fn enter_voice(&mut self) -> Transition {
        self.mode.set(Mode::VoiceControl);
        let voice = self.voice.clone();
        let character = self.character.clone();
        self.worker = Some(WorkerHandle::spawn(
            &self.runtime,
            &self.mode,
            Mode::VoiceControl,
            move |ctx| voice.run(ctx, character),
        ));
        log::info!("controller: voice control");
        self.announcer.say(phrases::VOICE_MODE);
        Transition::Entered(Mode::VoiceControl)
    }

    fn enter_gesture(&mut self) -> Transition {
        self.mode.set(Mode::GestureControl);
        let gesture = self.gesture.clone();
        let character = self.character.clone();
        self.worker = Some(WorkerHandle::spawn(
            &self.runtime,
            &self.mode,
            Mode::GestureControl,
            move |ctx| gesture.run(ctx, character),
        ));
        log::info!("controller: camera control");
        self.announcer.say(phrases::CAMERA_MODE);
        Transition::Entered(Mode::GestureControl)
    }

    fn stop_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            handle.stop(&self.runtime);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
