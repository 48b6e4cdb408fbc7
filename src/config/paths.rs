//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (`settings.toml`):
//!   Windows: %APPDATA%\puppet-control\
//!   macOS:   ~/Library/Application Support/puppet-control/
//!   Linux:   ~/.config/puppet-control/
//!
//! Data dir (ONNX / GGML models):
//!   Windows: %LOCALAPPDATA%\puppet-control\models\
//!   macOS:   ~/Library/Application Support/puppet-control/models/
//!   Linux:   ~/.local/share/puppet-control/models/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for the hand-landmark and Whisper model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "puppet-control";

    /// Resolves all paths, falling back to the current directory when the
    /// platform cannot provide a standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let models_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME)
            .join("models");

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
