//! The speech input worker.
//!
//! # Loop
//!
//! ```text
//! while ctx.should_run():
//!   spawn_blocking(microphone.listen)      calibrate → wait → record
//!   ctx.should_run()?                       mode may have changed meanwhile
//!   recognizer.recognize(audio, language)   async
//!   ctx.should_run()?
//!   say(text)                               fire-and-forget
//!   vocabulary.parse(text) → apply          under the character lock
//!   say("¡Bailando!" | "Dejo de bailar")    dance toggles only
//! ```
//!
//! Every iteration runs as its own tokio task so a panic inside it is
//! reported through the `JoinError` and the loop carries on.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::{ListenError, ListenParams, Microphone};
use crate::config::VoiceConfig;
use crate::controller::WorkerContext;
use crate::feedback::{phrases, Announcer};
use crate::state::{SharedCharacter, Viewport};
use crate::stt::{RecognizeError, SpeechRecognizer};

use super::commands::{apply, CommandEffect, Vocabulary};

/// Pause after a device-level failure before trying the microphone again.
const DEVICE_RETRY_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// VoiceSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub step: i32,
    pub language: String,
    pub listen: ListenParams,
    pub vocabulary: Vocabulary,
}

impl From<&VoiceConfig> for VoiceSettings {
    fn from(cfg: &VoiceConfig) -> Self {
        Self {
            step: cfg.step,
            language: cfg.language.clone(),
            listen: ListenParams::from(cfg),
            vocabulary: cfg.vocabulary.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// IterationOutcome
// ---------------------------------------------------------------------------

/// Result of one listen → recognize → apply pass.
#[derive(Debug)]
pub enum IterationOutcome {
    Applied(CommandEffect),
    /// Speech was understood but contained no command keyword.
    NoCommand(String),
    /// The worker stopped being wanted mid-iteration; nothing was applied.
    Cancelled,
    Listen(ListenError),
    Recognize(RecognizeError),
    /// The blocking listen task panicked.
    ListenPanicked(String),
}

impl IterationOutcome {
    fn log(&self) {
        match self {
            IterationOutcome::Applied(effect) => log::debug!("speech: applied {effect:?}"),
            IterationOutcome::NoCommand(text) => {
                log::debug!("speech: no command in \"{text}\"")
            }
            IterationOutcome::Cancelled => log::debug!("speech: iteration cancelled"),
            IterationOutcome::Listen(e) if e.is_timeout() => log::debug!("speech: {e}"),
            IterationOutcome::Listen(e) => log::warn!("speech: microphone error: {e}"),
            IterationOutcome::Recognize(RecognizeError::NoMatch) => {
                log::debug!("speech: could not understand audio")
            }
            IterationOutcome::Recognize(e) => log::warn!("speech: {e}"),
            IterationOutcome::ListenPanicked(e) => log::error!("speech: listen panicked: {e}"),
        }
    }

    /// Device-level failures that deserve a pause before retrying.
    fn needs_backoff(&self) -> bool {
        matches!(self, IterationOutcome::Listen(e) if !e.is_timeout())
            || matches!(self, IterationOutcome::ListenPanicked(_))
    }
}

// ---------------------------------------------------------------------------
// VoiceWorker
// ---------------------------------------------------------------------------

/// Everything the speech worker needs; cloned into each worker task.
#[derive(Clone)]
pub struct VoiceWorker {
    microphone: Arc<dyn Microphone>,
    recognizer: Arc<dyn SpeechRecognizer>,
    announcer: Announcer,
    settings: VoiceSettings,
    viewport: Viewport,
}

impl VoiceWorker {
    pub fn new(
        microphone: Arc<dyn Microphone>,
        recognizer: Arc<dyn SpeechRecognizer>,
        announcer: Announcer,
        settings: VoiceSettings,
        viewport: Viewport,
    ) -> Self {
        Self {
            microphone,
            recognizer,
            announcer,
            settings,
            viewport,
        }
    }

    /// Run until `ctx` says stop.
    pub async fn run(self, ctx: WorkerContext, character: SharedCharacter) {
        log::info!("speech: listening (language {})", self.settings.language);

        while ctx.should_run() {
            let pass = tokio::spawn(self.clone().run_once(ctx.clone(), character.clone()));
            match pass.await {
                Ok(outcome) => {
                    outcome.log();
                    if outcome.needs_backoff() && ctx.should_run() {
                        tokio::time::sleep(DEVICE_RETRY_DELAY).await;
                    }
                }
                Err(e) if e.is_panic() => log::error!("speech: iteration panicked: {e}"),
                Err(e) => log::warn!("speech: iteration aborted: {e}"),
            }
        }

        log::info!("speech: worker stopped");
    }

    /// One listen → recognize → apply pass.
    pub(crate) async fn run_once(
        self,
        ctx: WorkerContext,
        character: SharedCharacter,
    ) -> IterationOutcome {
        let microphone = Arc::clone(&self.microphone);
        let params = self.settings.listen.clone();
        let utterance = match tokio::task::spawn_blocking(move || microphone.listen(&params)).await
        {
            Ok(Ok(u)) => u,
            Ok(Err(e)) => return IterationOutcome::Listen(e),
            Err(e) => return IterationOutcome::ListenPanicked(e.to_string()),
        };

        if !ctx.should_run() {
            return IterationOutcome::Cancelled;
        }

        log::debug!(
            "speech: captured {:.2}s of audio",
            utterance.duration().as_secs_f32()
        );

        let text = match self
            .recognizer
            .recognize(&utterance.samples, &self.settings.language)
            .await
        {
            Ok(t) => t,
            Err(e) => return IterationOutcome::Recognize(e),
        };

        if !ctx.should_run() {
            return IterationOutcome::Cancelled;
        }

        log::info!("speech: heard \"{text}\"");
        self.announcer.say(&text);

        let Some(command) = self.settings.vocabulary.parse(&text) else {
            return IterationOutcome::NoCommand(text);
        };

        let effect =
            character.update(|state| apply(command, state, &self.viewport, self.settings.step));

        if let CommandEffect::DanceToggled(dancing) = effect {
            self.announcer.say(if dancing {
                phrases::DANCING
            } else {
                phrases::STOP_DANCING
            });
        }

        IterationOutcome::Applied(effect)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::audio::Utterance;
    use crate::state::{Mode, ModeCell};

    /// Replays scripted listens; once exhausted, waits briefly and times out.
    pub struct ScriptedMicrophone {
        script: Mutex<VecDeque<Result<Utterance, ListenError>>>,
        /// Switched to `Menu` during the next listen, if set.
        leave_mode: Option<ModeCell>,
    }

    impl ScriptedMicrophone {
        pub fn new(script: Vec<Result<Utterance, ListenError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                leave_mode: None,
            }
        }

        /// Every listen returns one phrase.
        pub fn phrases(n: usize) -> Self {
            Self::new((0..n).map(|_| Ok(phrase())).collect())
        }

        pub fn leaving_mode(mut self, cell: ModeCell) -> Self {
            self.leave_mode = Some(cell);
            self
        }
    }

    pub fn phrase() -> Utterance {
        Utterance {
            samples: vec![0.1; 16_000],
        }
    }

    impl Microphone for ScriptedMicrophone {
        fn listen(&self, _params: &ListenParams) -> Result<Utterance, ListenError> {
            if let Some(cell) = &self.leave_mode {
                cell.set(Mode::Menu);
            }
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(r) => r,
                None => {
                    std::thread::sleep(Duration::from_millis(10));
                    Err(ListenError::WaitTimeout)
                }
            }
        }
    }
}
