//! Drawing for the two screens: the mode menu and the character scene.

pub mod assets;
pub mod menu;
pub mod scene;

pub use assets::{AssetError, SpriteImages, SpriteTextures};
pub use menu::{draw_menu, MenuOption};
pub use scene::{draw_scene, pose_at, Pose};
