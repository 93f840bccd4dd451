use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub script_path: String,
    /// Played when no script is named on the command line.
    pub start_script: String,
    pub log_path: String,
    pub log_level: String,
    /// Seconds between frames.
    pub frame_time: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            script_path: "scripts/".into(),
            start_script: "intro".into(),
            log_path: "logs/".into(),
            log_level: "info".into(),
            frame_time: 1.0 / 30.0,
        }
    }
}
