//! Puppet control window: egui/eframe application.
//!
//! # Architecture
//!
//! [`PuppetApp`] is the top-level [`eframe::App`].  It owns the
//! [`ModeController`] and is the only place UI input reaches it:
//!
//! ```text
//! egui input ──collect──▶ FrameInput ──translate──▶ [ModeEvent]
//!                                                       │
//!                             ModeController::handle ◀──┘
//!                                       │ Transition::Quit
//!                                       ▼
//!                            ViewportCommand::Close
//! ```
//!
//! After dispatching, the frame is painted from a snapshot of the shared
//! character state and another repaint is scheduled one tick later.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::config::DisplayConfig;
use crate::controller::{ModeController, ModeEvent, Transition};
use crate::state::Mode;
use crate::ui::{draw_menu, draw_scene, MenuOption, SpriteImages, SpriteTextures};

/// OS window caption.  The menu heading is drawn separately.
pub const WINDOW_TITLE: &str = "Mono Controlado por Voz y Cámara";

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

/// Fixed-size, non-resizable window sized to the canvas.
pub fn native_options(display: &DisplayConfig) -> eframe::NativeOptions {
    let vp = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([display.width as f32, display.height as f32])
        .with_resizable(false);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Input translation
// ---------------------------------------------------------------------------

/// The parts of one frame's egui input that matter to the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub close_requested: bool,
    pub escape: bool,
    /// Primary-button presses, in canvas coordinates.
    pub clicks: Vec<egui::Pos2>,
}

impl FrameInput {
    fn collect(ctx: &egui::Context, origin: egui::Pos2) -> Self {
        ctx.input(|i| FrameInput {
            close_requested: i.viewport().close_requested(),
            escape: i.key_pressed(egui::Key::Escape),
            clicks: i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed: true,
                        ..
                    } => Some(egui::pos2(pos.x - origin.x, pos.y - origin.y)),
                    _ => None,
                })
                .collect(),
        })
    }
}

/// Map raw input to controller events.  Clicks only count on the menu.
pub fn translate(mode: Mode, input: &FrameInput) -> Vec<ModeEvent> {
    if input.close_requested {
        return vec![ModeEvent::Quit];
    }

    let mut events = Vec::new();
    if input.escape {
        events.push(ModeEvent::Cancel);
    }
    if mode == Mode::Menu {
        events.extend(
            input
                .clicks
                .iter()
                .filter_map(|p| MenuOption::hit_test(p.x, p.y))
                .map(|opt| opt.event()),
        );
    }
    events
}

// ---------------------------------------------------------------------------
// PuppetApp
// ---------------------------------------------------------------------------

pub struct PuppetApp {
    controller: ModeController,
    sprites: SpriteTextures,
    frame_interval: Duration,
    started: Instant,
    closing: bool,
}

impl PuppetApp {
    pub fn new(
        ctx: &egui::Context,
        controller: ModeController,
        sprites: SpriteImages,
        display: &DisplayConfig,
    ) -> Self {
        Self {
            controller,
            sprites: SpriteTextures::upload(ctx, sprites),
            frame_interval: Duration::from_millis(1000 / u64::from(display.fps.max(1))),
            started: Instant::now(),
            closing: false,
        }
    }

    /// Feed this frame's events to the controller.  Returns `true` once the
    /// window should close.
    fn dispatch(&mut self, input: &FrameInput) -> bool {
        for event in translate(self.controller.mode(), input) {
            if self.controller.handle(event) == Transition::Quit {
                return true;
            }
        }
        false
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for PuppetApp {
    /// Called every frame by eframe: drain input, dispatch, then paint.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let canvas = ctx.screen_rect();

        if !self.closing {
            let input = FrameInput::collect(ctx, canvas.min);
            if self.dispatch(&input) {
                log::info!("app: closing window");
                self.closing = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }

        let mode = self.controller.mode();
        let character = self.controller.character().snapshot();
        let elapsed_ms = self.elapsed_ms();

        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();
                match mode {
                    Mode::Menu => draw_menu(painter, rect),
                    Mode::VoiceControl | Mode::GestureControl => {
                        draw_scene(painter, rect, &self.sprites, character, mode, elapsed_ms)
                    }
                }
            });

        ctx.request_repaint_after(self.frame_interval);
    }

    /// Stop and join any running worker before the process exits.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.shutdown();
        log::info!("app: window closed");
    }
}
