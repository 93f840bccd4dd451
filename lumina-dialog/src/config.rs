use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use lumina_ui::{Color, Vec2};

use crate::error::Result;

pub const DEFAULT_FONT: &str = "fonts/DejaVuSans-Bold.ttf";

/// Dialogue-wide defaults, read from the `[dialog]` section of the shared
/// config and overridable per dialogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    pub wpm_speed: f32,
    pub font: String,
    /// Horizontal center of the choice menu; derived from the box width when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_x: Option<f32>,
    pub choice_y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_width: Option<f32>,
    pub choice_height: f32,
    pub choice_size: f32,
    pub choice_color: Color,
    pub unfold_factor: f32,
    pub autoplace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplace_portrait: Option<String>,
    pub autoplace_portrait_size: f32,
    pub autoplace_width: f32,
    pub can_skip: bool,
    pub can_end: bool,
    pub named_positions: HashMap<String, Vec2>,
    pub named_sizes: HashMap<String, f32>,
    pub named_widths: HashMap<String, f32>,
    pub named_portrait_sizes: HashMap<String, f32>,
    pub named_ctimes: HashMap<String, f32>,
    /// Seeds the random pick among non-played choices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub timing: TimingConfig,
    pub layout: LayoutConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub swipe_duration: f32,
    pub min_read_time: f32,
    pub silent_alpha: f32,
    pub silent_fade_time: f32,
    pub stage_fade_time: f32,
    pub arrow_size: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin: Vec2,
    pub gap: f32,
    pub slide_duration: f32,
    pub played_priority: i32,
    pub addressed_priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub skip_trigger: String,
    pub end_trigger: String,
    pub priority: i32,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            wpm_speed: 100.0,
            font: DEFAULT_FONT.into(),
            choice_x: None,
            choice_y: -0.85,
            choice_width: None,
            choice_height: 0.05,
            choice_size: 10.0,
            choice_color: Color::GRAY,
            unfold_factor: 0.0,
            autoplace: false,
            autoplace_portrait: None,
            autoplace_portrait_size: 0.2,
            autoplace_width: 0.8,
            can_skip: false,
            can_end: false,
            named_positions: HashMap::new(),
            named_sizes: HashMap::new(),
            named_widths: HashMap::new(),
            named_portrait_sizes: HashMap::new(),
            named_ctimes: HashMap::new(),
            seed: None,
            timing: TimingConfig::default(),
            layout: LayoutConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            swipe_duration: 0.2,
            min_read_time: 2.0,
            silent_alpha: 0.5,
            silent_fade_time: 0.1,
            stage_fade_time: 0.1,
            arrow_size: 0.08,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: Vec2::new(0.1, 0.06),
            gap: 0.03,
            slide_duration: 0.25,
            played_priority: 100,
            addressed_priority: 10,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_trigger: "space".into(),
            end_trigger: "escape".into(),
            priority: 20,
        }
    }
}

impl DialogConfig {
    /// Section `[dialog]` of the shared config store.
    pub fn from_shared() -> Self {
        lumina_shared::config::get("dialog")
    }

    /// Layers `overrides` over this config. Tables merge key by key, so a
    /// dialogue can add one named position without dropping the others.
    pub fn with_overrides(&self, overrides: &toml::Table) -> Result<DialogConfig> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }
        let mut base = match toml::Value::try_from(self)? {
            toml::Value::Table(t) => t,
            _ => toml::Table::new(),
        };
        merge_tables(&mut base, overrides);
        Ok(toml::Value::Table(base).try_into()?)
    }
}

fn merge_tables(base: &mut toml::Table, overrides: &toml::Table) {
    for (key, val) in overrides {
        match (base.get_mut(key), val) {
            (Some(toml::Value::Table(b)), toml::Value::Table(o)) => merge_tables(b, o),
            _ => {
                base.insert(key.clone(), val.clone());
            }
        }
    }
}
