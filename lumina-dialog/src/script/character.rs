use serde::{Deserialize, Serialize};
use lumina_ui::{Align, Anchor, Color, Vec2};

use crate::error::Result;
use crate::script::Named;

pub type CharacterId = String;

/// Opaque key of a moving world object whose projected screen position a
/// speaker bubble follows. Resolved by the host's projector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldAnchor(pub String);

impl From<&str> for WorldAnchor {
    fn from(s: &str) -> Self {
        WorldAnchor(s.to_string())
    }
}

/// Static presentation profile of a speaker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Character {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub portrait: Option<String>,
    pub portrait_size: Named<f32>,
    pub width: Named<f32>,
    pub pos: Named<Vec2>,
    pub font: Option<String>,
    pub size: Named<f32>,
    pub color: Color,
    pub shadow_color: Option<Color>,
    pub outline_color: Color,
    pub outline_width: f32,
    pub align: Align,
    pub anchor: Anchor,
    /// Angle in degrees of the wipe used to reveal and cover lines.
    pub swipe: Option<f32>,
    pub wpm_speed: Option<f32>,
    pub unfold_factor: Option<f32>,
    pub unfold_sound: Option<String>,
    pub unfold_volume: f32,
    pub line_sound: Option<String>,
    pub line_volume: f32,
    pub line_sound_loop: bool,
    /// `None` defers to the dialogue default for world-anchored speakers.
    pub autoplace: Option<bool>,
    pub autoplace_priority: Option<i32>,
    pub world_anchor: Option<WorldAnchor>,
    pub world_offset: Option<[f32; 3]>,
    pub played: bool,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            long_name: None,
            short_name: None,
            portrait: None,
            portrait_size: Named::Value(0.3),
            width: Named::Value(1.0),
            pos: Named::Value(Vec2::ZERO),
            font: None,
            size: Named::Value(12.0),
            color: Color::WHITE,
            shadow_color: None,
            outline_color: Color::BLACK,
            outline_width: 1.0,
            align: Align::Left,
            anchor: Anchor::MIDDLE_CENTER,
            swipe: None,
            wpm_speed: None,
            unfold_factor: None,
            unfold_sound: None,
            unfold_volume: 1.0,
            line_sound: None,
            line_volume: 1.0,
            line_sound_loop: false,
            autoplace: None,
            autoplace_priority: None,
            world_anchor: None,
            world_offset: None,
            played: false,
        }
    }
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            long_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn played(mut self, played: bool) -> Self {
        self.played = played;
        self
    }

    pub fn pos(mut self, pos: Vec2) -> Self {
        self.pos = Named::Value(pos);
        self
    }

    pub fn named_pos(mut self, name: impl Into<String>) -> Self {
        self.pos = Named::Name(name.into());
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Named::Value(width);
        self
    }

    /// Anchor spec such as `tl` or `mc`; rejects anything outside the closed set.
    pub fn anchor(mut self, spec: &str) -> Result<Self> {
        self.anchor = spec.parse()?;
        Ok(self)
    }

    pub fn align(mut self, spec: &str) -> Result<Self> {
        self.align = spec.parse()?;
        Ok(self)
    }

    pub fn swipe(mut self, angle_deg: f32) -> Self {
        self.swipe = Some(angle_deg);
        self
    }

    pub fn wpm(mut self, wpm: f32) -> Self {
        self.wpm_speed = Some(wpm);
        self
    }

    pub fn unfold(mut self, factor: f32) -> Self {
        self.unfold_factor = Some(factor);
        self
    }

    pub fn autoplace(mut self, on: bool) -> Self {
        self.autoplace = Some(on);
        self
    }

    pub fn priority(mut self, prio: i32) -> Self {
        self.autoplace_priority = Some(prio);
        self
    }

    pub fn tracking(mut self, anchor: impl Into<WorldAnchor>) -> Self {
        self.world_anchor = Some(anchor.into());
        self
    }

    pub fn line_sound(mut self, path: impl Into<String>, volume: f32, looping: bool) -> Self {
        self.line_sound = Some(path.into());
        self.line_volume = volume;
        self.line_sound_loop = looping;
        self
    }

    /// Copy of `self` with every field set in `patch` overridden.
    pub fn supplement(&self, patch: &CharacterMod) -> Character {
        let mut ch = self.clone();
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field { ch.$field = v.clone(); })*
            };
        }
        macro_rules! set_some {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field { ch.$field = Some(v.clone()); })*
            };
        }
        set!(
            portrait_size, width, pos, size, color, outline_color, outline_width,
            align, anchor, unfold_volume, line_volume, line_sound_loop, played,
        );
        set_some!(
            long_name, short_name, portrait, font, shadow_color, swipe, wpm_speed,
            unfold_factor, unfold_sound, line_sound, autoplace, autoplace_priority,
            world_anchor, world_offset,
        );
        ch
    }
}

/// Sparse override of a [`Character`]; unset fields keep the base value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CharacterMod {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub portrait: Option<String>,
    pub portrait_size: Option<Named<f32>>,
    pub width: Option<Named<f32>>,
    pub pos: Option<Named<Vec2>>,
    pub font: Option<String>,
    pub size: Option<Named<f32>>,
    pub color: Option<Color>,
    pub shadow_color: Option<Color>,
    pub outline_color: Option<Color>,
    pub outline_width: Option<f32>,
    pub align: Option<Align>,
    pub anchor: Option<Anchor>,
    pub swipe: Option<f32>,
    pub wpm_speed: Option<f32>,
    pub unfold_factor: Option<f32>,
    pub unfold_sound: Option<String>,
    pub unfold_volume: Option<f32>,
    pub line_sound: Option<String>,
    pub line_volume: Option<f32>,
    pub line_sound_loop: Option<bool>,
    pub autoplace: Option<bool>,
    pub autoplace_priority: Option<i32>,
    pub world_anchor: Option<WorldAnchor>,
    pub world_offset: Option<[f32; 3]>,
    pub played: Option<bool>,
}

impl CharacterMod {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(Named::Value(size));
        self
    }

    pub fn portrait(mut self, path: impl Into<String>) -> Self {
        self.portrait = Some(path.into());
        self
    }

    pub fn wpm(mut self, wpm: f32) -> Self {
        self.wpm_speed = Some(wpm);
        self
    }

    pub fn anchor(mut self, spec: &str) -> Result<Self> {
        self.anchor = Some(spec.parse()?);
        Ok(self)
    }
}
