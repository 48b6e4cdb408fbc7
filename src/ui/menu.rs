//! Mode-selection menu.

use eframe::egui;

use crate::controller::ModeEvent;

pub const TITLE: &str = "Selecciona Modo de Control";

const OPTION_X: f32 = 100.0;
const HIT_WIDTH: f32 = 300.0;
const HIT_HEIGHT: f32 = 50.0;
const TITLE_Y: f32 = 100.0;
const FONT_SIZE: f32 = 40.0;

pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(240, 240, 240);

/// One clickable menu row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Voice,
    Camera,
    Exit,
}

impl MenuOption {
    pub const ALL: [MenuOption; 3] = [MenuOption::Voice, MenuOption::Camera, MenuOption::Exit];

    pub fn label(&self) -> &'static str {
        match self {
            MenuOption::Voice => "Control por Voz",
            MenuOption::Camera => "Control por Cámara",
            MenuOption::Exit => "Salir",
        }
    }

    /// Top edge of the row.
    pub fn top(&self) -> f32 {
        match self {
            MenuOption::Voice => 200.0,
            MenuOption::Camera => 300.0,
            MenuOption::Exit => 400.0,
        }
    }

    pub fn event(&self) -> ModeEvent {
        match self {
            MenuOption::Voice => ModeEvent::SelectVoice,
            MenuOption::Camera => ModeEvent::SelectGesture,
            MenuOption::Exit => ModeEvent::SelectExit,
        }
    }

    /// Option under the canvas point (`x`, `y`), bounds inclusive.
    pub fn hit_test(x: f32, y: f32) -> Option<MenuOption> {
        if !(OPTION_X..=OPTION_X + HIT_WIDTH).contains(&x) {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|opt| (opt.top()..=opt.top() + HIT_HEIGHT).contains(&y))
    }

    fn color(&self) -> egui::Color32 {
        match self {
            MenuOption::Voice => egui::Color32::from_rgb(0, 0, 200),
            _ => egui::Color32::from_rgb(0, 0, 100),
        }
    }
}

/// Paint the menu into `rect`; option coordinates are relative to its
/// top-left corner.
pub fn draw_menu(painter: &egui::Painter, rect: egui::Rect) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let font = egui::FontId::proportional(FONT_SIZE);
    painter.text(
        egui::pos2(rect.center().x, rect.top() + TITLE_Y),
        egui::Align2::CENTER_TOP,
        TITLE,
        font.clone(),
        egui::Color32::BLACK,
    );

    for opt in MenuOption::ALL {
        painter.text(
            rect.min + egui::vec2(OPTION_X, opt.top()),
            egui::Align2::LEFT_TOP,
            opt.label(),
            font.clone(),
            opt.color(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_zones_cover_each_row() {
        assert_eq!(MenuOption::hit_test(150.0, 220.0), Some(MenuOption::Voice));
        assert_eq!(MenuOption::hit_test(399.0, 349.0), Some(MenuOption::Camera));
        assert_eq!(MenuOption::hit_test(100.0, 400.0), Some(MenuOption::Exit));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(MenuOption::hit_test(400.0, 250.0), Some(MenuOption::Voice));
        assert_eq!(MenuOption::hit_test(100.0, 450.0), Some(MenuOption::Exit));
    }

    #[test]
    fn gaps_and_margins_miss() {
        assert_eq!(MenuOption::hit_test(150.0, 275.0), None);
        assert_eq!(MenuOption::hit_test(99.0, 220.0), None);
        assert_eq!(MenuOption::hit_test(401.0, 320.0), None);
        assert_eq!(MenuOption::hit_test(150.0, 460.0), None);
    }

    #[test]
    fn options_map_to_controller_events() {
        assert_eq!(MenuOption::Voice.event(), ModeEvent::SelectVoice);
        assert_eq!(MenuOption::Camera.event(), ModeEvent::SelectGesture);
        assert_eq!(MenuOption::Exit.event(), ModeEvent::SelectExit);
    }
}
