//! Sprite bitmaps.
//!
//! Both poses are decoded with the `image` crate and scaled to a square of
//! `sprite_size`.  A file that is missing or cannot be decoded is replaced by
//! a solid placeholder (red for the normal pose, green for the dancing pose)
//! so the scene always has something to draw.

use std::path::{Path, PathBuf};

use eframe::egui;
use image::imageops::FilterType;
use thiserror::Error;

use crate::config::DisplayConfig;

pub const NORMAL_PLACEHOLDER: egui::Color32 = egui::Color32::from_rgb(255, 0, 0);
pub const DANCING_PLACEHOLDER: egui::Color32 = egui::Color32::from_rgb(0, 255, 0);

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load sprite {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode `path` and scale it to `size × size` RGBA.
pub fn load_sprite(path: &Path, size: u32) -> Result<egui::ColorImage, AssetError> {
    let decoded = image::open(path).map_err(|source| AssetError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.resize_exact(size, size, FilterType::Triangle).to_rgba8();
    let dims = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(dims, rgba.as_raw()))
}

/// Solid square of `color`.
pub fn placeholder(size: u32, color: egui::Color32) -> egui::ColorImage {
    egui::ColorImage::new([size as usize, size as usize], color)
}

fn load_or_placeholder(path: &Path, size: u32, color: egui::Color32) -> egui::ColorImage {
    match load_sprite(path, size) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("ui: {e}; using placeholder");
            placeholder(size, color)
        }
    }
}

/// Decoded pose bitmaps, not yet uploaded to the GPU.
pub struct SpriteImages {
    pub normal: egui::ColorImage,
    pub dancing: egui::ColorImage,
}

impl SpriteImages {
    pub fn load(config: &DisplayConfig) -> Self {
        Self {
            normal: load_or_placeholder(
                &config.normal_sprite,
                config.sprite_size,
                NORMAL_PLACEHOLDER,
            ),
            dancing: load_or_placeholder(
                &config.dancing_sprite,
                config.sprite_size,
                DANCING_PLACEHOLDER,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

pub struct SpriteTextures {
    pub normal: egui::TextureHandle,
    pub dancing: egui::TextureHandle,
}

impl SpriteTextures {
    pub fn upload(ctx: &egui::Context, images: SpriteImages) -> Self {
        Self {
            normal: ctx.load_texture("sprite-normal", images.normal, egui::TextureOptions::LINEAR),
            dancing: ctx.load_texture(
                "sprite-dancing",
                images.dancing,
                egui::TextureOptions::LINEAR,
            ),
        }
    }
}
