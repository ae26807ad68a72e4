//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voice-translator\
//!   macOS:   ~/Library/Application Support/voice-translator/
//!   Linux:   ~/.config/voice-translator/
//!
//! Data dir (Whisper models):
//!   Windows: %LOCALAPPDATA%\voice-translator\
//!   macOS:   ~/Library/Application Support/voice-translator/
//!   Linux:   ~/.local/share/voice-translator/

use std::path::PathBuf;

/// Resolved application directory and file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for GGML Whisper model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-translator";

    /// Falls back to the current directory when the platform has no
    /// standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            models_dir: data_dir.join("models"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced_by_app() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.ends_with("voice-translator"));
        assert!(paths.models_dir.ends_with("voice-translator/models"));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.settings_file.starts_with(&paths.config_dir));
    }
}
