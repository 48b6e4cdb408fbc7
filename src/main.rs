//! Application entry point for Puppet Control.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers) that hosts the
//!    active input worker.
//! 4. Build the speech recognizer and hand detector.  Either degrades to an
//!    "unavailable" stand-in when its model cannot be loaded.
//! 5. Decode the sprites.
//! 6. Run [`eframe::run_native`], which blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use puppet_control::{
    app::{native_options, PuppetApp, WINDOW_TITLE},
    audio::CpalMicrophone,
    config::{AppConfig, AppPaths, DisplayConfig},
    controller::ModeController,
    feedback::Announcer,
    gesture::{build_detector, GestureWorker, NokhwaCamera},
    state::{CharacterState, SharedCharacter},
    stt::build_recognizer,
    ui::SpriteImages,
    voice::{VoiceSettings, VoiceWorker},
};

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Puppet Control starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();
    let viewport = config.display.viewport();

    // 3. Tokio runtime (2 worker threads: one input worker plus blocking
    //    capture/inference spill-over)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    // 4. Input pipelines
    let announcer = Announcer::from_config(&config.feedback);
    let recognizer = build_recognizer(&config.recognizer, &paths);
    let voice = VoiceWorker::new(
        Arc::new(CpalMicrophone::new()),
        recognizer,
        announcer.clone(),
        VoiceSettings::from(&config.voice),
        viewport,
    );

    let detector = build_detector(
        &config.gesture.landmark_model_path(&paths),
        config.gesture.presence_threshold,
    );
    let gesture = GestureWorker::new(
        Arc::new(NokhwaCamera::new(config.gesture.camera_index)),
        detector,
        viewport,
    );

    let character = SharedCharacter::new(CharacterState::new(&viewport));
    let controller =
        ModeController::new(rt.handle().clone(), character, voice, gesture, announcer);

    // 5. Sprites
    let sprites = SpriteImages::load(&config.display);

    // 6. Run the window (blocks until closed).  `rt` stays alive for the
    //    whole call so the controller can join its worker on exit.
    let options = native_options(&config.display);
    let display = config.display.clone();

    let result = eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            Ok(Box::new(PuppetApp::new(
                &cc.egui_ctx,
                controller,
                sprites,
                &display,
            )))
        }),
    );

    log::info!("Puppet Control shut down");
    drop(rt);
    result
}
