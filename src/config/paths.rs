//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout (config dir):
//!   Windows: %APPDATA%\tts-field-helper\
//!   macOS:   ~/Library/Application Support/tts-field-helper/
//!   Linux:   ~/.config/tts-field-helper/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.json` and `runtime.toml`.
    pub config_dir: PathBuf,
    /// Full path to the persisted settings document.
    pub settings_file: PathBuf,
    /// Full path to the runtime options file.
    pub runtime_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "tts-field-helper";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.json");
        let runtime_file = config_dir.join("runtime.toml");

        Self {
            config_dir,
            settings_file,
            runtime_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
