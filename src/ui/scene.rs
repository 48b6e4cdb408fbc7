//! Character scene shown while a control mode is active.

use eframe::egui;

use super::assets::SpriteTextures;
use crate::state::{CharacterState, Mode};

/// Half-period of the dance animation.
pub const DANCE_FRAME_MS: u64 = 500;

pub const HINT: &str = "Presiona ESC para volver al menú";

const MARGIN: f32 = 20.0;
const FONT_SIZE: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Normal,
    Dancing,
}

/// Pose for this tick.  The alternation follows the wall clock, not the
/// moment dancing started.
pub fn pose_at(is_animating: bool, elapsed_ms: u64) -> Pose {
    if is_animating && (elapsed_ms / DANCE_FRAME_MS) % 2 == 0 {
        Pose::Dancing
    } else {
        Pose::Normal
    }
}

pub fn draw_scene(
    painter: &egui::Painter,
    rect: egui::Rect,
    sprites: &SpriteTextures,
    character: CharacterState,
    mode: Mode,
    elapsed_ms: u64,
) {
    painter.rect_filled(rect, 0.0, egui::Color32::WHITE);

    let texture = match pose_at(character.is_animating, elapsed_ms) {
        Pose::Dancing => &sprites.dancing,
        Pose::Normal => &sprites.normal,
    };
    let center = rect.min + egui::vec2(character.position.x as f32, character.position.y as f32);
    painter.image(
        texture.id(),
        egui::Rect::from_center_size(center, texture.size_vec2()),
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let font = egui::FontId::proportional(FONT_SIZE);
    painter.text(
        rect.min + egui::vec2(MARGIN, MARGIN),
        egui::Align2::LEFT_TOP,
        HINT,
        font.clone(),
        egui::Color32::BLACK,
    );
    painter.text(
        egui::pos2(rect.right() - MARGIN, rect.top() + MARGIN),
        egui::Align2::RIGHT_TOP,
        format!("Modo: {}", mode.label()),
        font,
        egui::Color32::from_rgb(0, 0, 200),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_character_never_dances() {
        for ms in [0, 250, 500, 999, 1000] {
            assert_eq!(pose_at(false, ms), Pose::Normal);
        }
    }

    #[test]
    fn dancing_alternates_every_half_second() {
        assert_eq!(pose_at(true, 0), Pose::Dancing);
        assert_eq!(pose_at(true, 499), Pose::Dancing);
        assert_eq!(pose_at(true, 500), Pose::Normal);
        assert_eq!(pose_at(true, 999), Pose::Normal);
        assert_eq!(pose_at(true, 1000), Pose::Dancing);
    }
}
