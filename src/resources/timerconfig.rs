//! Scheduler configuration resource.
//!
//! Holds the host and scheduler settings loaded from an INI file. Defaults
//! are safe for startup, and missing keys keep their current value.
//!
//! # Configuration File Format
//!
//! ```ini
//! [host]
//! kind = runtime
//! fps = 60
//! frames = 600
//! jitter = 0.0
//!
//! [time]
//! time_scale = 1.0
//!
//! [autosave]
//! enabled = true
//! interval = 5.0
//! ```

use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::resources::timermanager::HostKind;

const DEFAULT_FPS: u32 = 60;
const DEFAULT_FRAMES: u32 = 600;
const DEFAULT_JITTER: f32 = 0.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_AUTOSAVE_ENABLED: bool = true;
const DEFAULT_AUTOSAVE_INTERVAL: f32 = 5.0;
const DEFAULT_CONFIG_PATH: &str = "./quicktimer.ini";

/// Host and scheduler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Which host the timer manager is built for.
    pub host_kind: HostKind,
    /// Simulated frames per second.
    pub fps: u32,
    /// Frames the demo host runs before shutting down.
    pub frames: u32,
    /// Random fraction (0..1) by which each frame delta may deviate.
    pub jitter: f32,
    /// Initial world time scale.
    pub time_scale: f32,
    pub autosave_enabled: bool,
    /// Seconds between autosaves.
    pub autosave_interval: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            host_kind: HostKind::Runtime,
            fps: DEFAULT_FPS,
            frames: DEFAULT_FRAMES,
            jitter: DEFAULT_JITTER,
            time_scale: DEFAULT_TIME_SCALE,
            autosave_enabled: DEFAULT_AUTOSAVE_ENABLED,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Unscaled length of one frame in seconds.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config)?;
        info!("Loaded config from {:?}: {}", self.config_path, self.summary());
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, content: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> Result<(), String> {
        // [host] section
        if let Some(kind) = config.get("host", "kind") {
            self.host_kind = kind.parse()?;
        }
        if let Some(fps) = config.getuint("host", "fps")? {
            let fps = u32::try_from(fps).map_err(|_| format!("host.fps out of range: {}", fps))?;
            if fps == 0 {
                return Err("host.fps must be positive".to_string());
            }
            self.fps = fps;
        }
        if let Some(frames) = config.getuint("host", "frames")? {
            self.frames =
                u32::try_from(frames).map_err(|_| format!("host.frames out of range: {}", frames))?;
        }
        if let Some(jitter) = config.getfloat("host", "jitter")? {
            self.jitter = (jitter as f32).clamp(0.0, 1.0);
        }

        // [time] section
        if let Some(scale) = config.getfloat("time", "time_scale")? {
            if scale < 0.0 {
                return Err(format!("time.time_scale must not be negative, got {}", scale));
            }
            self.time_scale = scale as f32;
        }

        // [autosave] section
        if let Some(enabled) = config.getbool("autosave", "enabled")? {
            self.autosave_enabled = enabled;
        }
        if let Some(interval) = config.getfloat("autosave", "interval")? {
            self.autosave_interval = interval as f32;
        }
        // A non-positive interval means "off", as with `--autosave-interval 0`.
        if self.autosave_enabled && self.autosave_interval <= 0.0 {
            warn!(
                "autosave.interval {} is not positive, autosave disabled",
                self.autosave_interval
            );
            self.autosave_enabled = false;
        }
        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("host", "kind", Some(self.host_kind.to_string()));
        config.set("host", "fps", Some(self.fps.to_string()));
        config.set("host", "frames", Some(self.frames.to_string()));
        config.set("host", "jitter", Some(self.jitter.to_string()));

        config.set("time", "time_scale", Some(self.time_scale.to_string()));

        config.set("autosave", "enabled", Some(self.autosave_enabled.to_string()));
        config.set("autosave", "interval", Some(self.autosave_interval.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    fn summary(&self) -> String {
        format!(
            "host={}, fps={}, frames={}, jitter={}, time_scale={}, autosave={} every {}s",
            self.host_kind,
            self.fps,
            self.frames,
            self.jitter,
            self.time_scale,
            self.autosave_enabled,
            self.autosave_interval
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::new();
        assert_eq!(config.host_kind, HostKind::Runtime);
        assert_eq!(config.fps, DEFAULT_FPS);
        assert_eq!(config.time_scale, DEFAULT_TIME_SCALE);
        assert!(config.autosave_enabled);
    }

    #[test]
    fn test_load_from_str_overrides_present_keys() {
        let mut config = SchedulerConfig::new();
        config
            .load_from_str(
                "[host]\nkind = editor\nfps = 30\n\n[time]\ntime_scale = 0.5\n\n[autosave]\nenabled = false\n",
            )
            .unwrap();
        assert_eq!(config.host_kind, HostKind::Editor);
        assert_eq!(config.fps, 30);
        assert_eq!(config.time_scale, 0.5);
        assert!(!config.autosave_enabled);
        // Untouched keys keep defaults.
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.autosave_interval, DEFAULT_AUTOSAVE_INTERVAL);
    }

    #[test]
    fn test_jitter_is_clamped() {
        let mut config = SchedulerConfig::new();
        config.load_from_str("[host]\njitter = 4.0\n").unwrap();
        assert_eq!(config.jitter, 1.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = SchedulerConfig::new();
        assert!(config.load_from_str("[host]\nkind = console\n").is_err());
        assert!(config.load_from_str("[host]\nfps = 0\n").is_err());
        assert!(config.load_from_str("[time]\ntime_scale = -1\n").is_err());
        assert!(config.load_from_str("[host]\nfps = fast\n").is_err());
    }

    #[test]
    fn test_values_beyond_u32_are_rejected() {
        let mut config = SchedulerConfig::new();
        assert!(config.load_from_str("[host]\nfps = 4294967296\n").is_err());
        assert!(config.load_from_str("[host]\nframes = 4294967296\n").is_err());
        assert_eq!(config.fps, DEFAULT_FPS);
        assert_eq!(config.frames, DEFAULT_FRAMES);

        config.load_from_str("[host]\nframes = 4294967295\n").unwrap();
        assert_eq!(config.frames, u32::MAX);
    }

    #[test]
    fn test_non_positive_autosave_interval_disables_autosave() {
        for interval in ["0", "-2.5"] {
            let mut config = SchedulerConfig::new();
            config
                .load_from_str(&format!(
                    "[autosave]\nenabled = true\ninterval = {}\n",
                    interval
                ))
                .unwrap();
            assert!(!config.autosave_enabled);
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "quicktimer_config_{}_{}.ini",
            std::process::id(),
            fastrand::u64(..)
        ));
        let mut saved = SchedulerConfig::with_path(&path);
        saved.host_kind = HostKind::Editor;
        saved.fps = 30;
        saved.frames = 90;
        saved.jitter = 0.25;
        saved.time_scale = 0.5;
        saved.autosave_enabled = false;
        saved.autosave_interval = 12.5;
        saved.save_to_file().unwrap();

        let mut loaded = SchedulerConfig::with_path(&path);
        let result = loaded.load_from_file();
        let _ = std::fs::remove_file(&path);
        result.unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = SchedulerConfig::with_path("./does/not/exist.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config, SchedulerConfig::with_path("./does/not/exist.ini"));
    }

    #[test]
    fn test_frame_delta() {
        let mut config = SchedulerConfig::new();
        config.fps = 50;
        assert!((config.frame_delta() - 0.02).abs() < 1e-6);
    }
}
