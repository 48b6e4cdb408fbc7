//! Hand landmarks and the geometry that turns them into character state.

use crate::state::{Position, Viewport};

/// Number of points in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

/// One landmark in normalized image coordinates: `x`, `y` in `[0, 1]`
/// (origin top-left), `z` relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Indices into the 21-point hand skeleton used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum HandPoint {
    Wrist = 0,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerTip = 8,
}

/// A full 21-point hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks([Landmark; LANDMARK_COUNT]);

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    /// Build from `x, y, z` triplets.  Extra values are ignored; fewer than
    /// 63 values yields `None`.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() < LANDMARK_COUNT * 3 {
            return None;
        }
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (point, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Landmark::new(xyz[0], xyz[1], xyz[2]);
        }
        Some(Self(points))
    }

    pub fn get(&self, point: HandPoint) -> Landmark {
        self.0[point as usize]
    }
}

/// What one detected hand means for the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureReading {
    pub position: Position,
    pub is_animating: bool,
}

/// Index fingertip sets the absolute position; a thumb raised above the
/// index knuckle means "dance".  Depends on this frame only.
pub fn read_gesture(hand: &HandLandmarks, viewport: &Viewport) -> GestureReading {
    let tip = hand.get(HandPoint::IndexFingerTip);
    let raw = Position::new(
        (tip.x * viewport.width as f32) as i32,
        (tip.y * viewport.height as f32) as i32,
    );

    let thumb = hand.get(HandPoint::ThumbTip);
    let knuckle = hand.get(HandPoint::IndexFingerMcp);

    GestureReading {
        position: viewport.clamp_to_bounds(raw),
        is_animating: thumb.y < knuckle.y,
    }
}

#[cfg(test)]
pub(crate) fn hand_with(tip: (f32, f32), thumb_y: f32, mcp_y: f32) -> HandLandmarks {
    let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
    points[HandPoint::IndexFingerTip as usize] = Landmark::new(tip.0, tip.1, 0.0);
    points[HandPoint::ThumbTip as usize] = Landmark::new(0.4, thumb_y, 0.0);
    points[HandPoint::IndexFingerMcp as usize] = Landmark::new(0.45, mcp_y, 0.0);
    HandLandmarks::new(points)
}
