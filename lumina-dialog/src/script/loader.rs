//! Declarative dialogue documents.
//!
//! ```toml
//! [options]
//! can_skip = true
//!
//! [characters.alice]
//! long_name = "Alice"
//! played = true
//!
//! [[branches.start]]
//! kind = "speech"
//! speaker = "alice"
//! line = { text = "Hello there.", ctime_factor = 0.5 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use serde::Deserialize;

use crate::config::DialogConfig;
use crate::error::{DialogError, Result};
use crate::executor::{Dialog, DialogBuilder};
use crate::script::{
    Character, CharacterMod, Item, Line, Named, Pause, Script, Speech, StageChange,
    Transition, UpdateChar,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialogDocument {
    /// Layered over the `[dialog]` config section for this dialogue only.
    pub options: toml::Table,
    pub characters: BTreeMap<String, Character>,
    pub character_mods: BTreeMap<String, CharacterMod>,
    pub branches: BTreeMap<String, Vec<ItemDoc>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDoc {
    Speech(SpeechDoc),
    Pause(PauseDoc),
    Entry(StageDoc),
    Exit(StageDoc),
    UpdateChar(UpdateDoc),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechDoc {
    pub speaker: String,
    pub line: Option<LineDoc>,
    pub choices: Option<Vec<LineDoc>>,
    /// Name of an entry in `character_mods`.
    pub charmod: Option<String>,
    pub restyle: Option<CharacterMod>,
}

/// A bare string, or a table with the line's timing and audio.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LineDoc {
    Text(String),
    Full(LineTable),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineTable {
    pub text: String,
    #[serde(default = "enabled")]
    pub active: bool,
    pub branch: Option<String>,
    pub time: Option<f32>,
    pub time_factor: Option<f32>,
    pub ctime: Option<Named<f32>>,
    pub ctime_factor: Option<f32>,
    pub font: Option<String>,
    pub voice: Option<String>,
    pub volume: Option<f32>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PauseDoc {
    pub time: f32,
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDoc {
    /// Everyone when absent.
    pub speakers: Option<Vec<String>>,
    #[serde(default)]
    pub transition: Transition,
    pub ctime: Option<Named<f32>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDoc {
    pub speaker: String,
    pub set: CharacterMod,
}

impl DialogDocument {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading dialog script {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn script(&self) -> Result<Script> {
        let mut branches = Vec::with_capacity(self.branches.len());
        for (name, docs) in &self.branches {
            let items = docs
                .iter()
                .map(|doc| doc.to_item())
                .collect::<Result<Vec<_>>>()?;
            branches.push((name.clone(), items));
        }
        Script::new(branches)
    }

    /// Builder with this document's characters, mods and options on top of `base`.
    pub fn into_builder(self, base: DialogConfig) -> Result<DialogBuilder> {
        let script = Rc::new(self.script()?);
        let mut builder = Dialog::builder(script).config(base).options(&self.options)?;
        for (id, ch) in self.characters {
            builder = builder.character(id, ch);
        }
        for (name, m) in self.character_mods {
            builder = builder.character_mod(name, m);
        }
        Ok(builder)
    }
}

impl ItemDoc {
    fn to_item(&self) -> Result<Item> {
        Ok(match self {
            ItemDoc::Speech(doc) => Item::Speech(doc.to_speech()?),
            ItemDoc::Pause(doc) => {
                let mut pause = Pause::new(doc.time);
                if let Some(target) = &doc.branch {
                    pause = pause.branch(target.clone());
                }
                Item::Pause(pause)
            }
            ItemDoc::Entry(doc) => Item::Entry(doc.to_change()),
            ItemDoc::Exit(doc) => Item::Exit(doc.to_change()),
            ItemDoc::UpdateChar(doc) => Item::UpdateChar(UpdateChar {
                speaker: doc.speaker.clone(),
                charmod: doc.set.clone(),
            }),
        })
    }
}

impl SpeechDoc {
    fn to_speech(&self) -> Result<Speech> {
        let mut speech = match (&self.line, &self.choices) {
            (Some(line), None) => Speech::new(self.speaker.clone(), line.to_line()),
            (None, Some(choices)) if !choices.is_empty() => Speech::choice(
                self.speaker.clone(),
                choices.iter().map(LineDoc::to_line).collect(),
            ),
            _ => {
                return Err(DialogError::InvalidItem(format!(
                    "speech of '{}' needs exactly one of `line` or a non-empty `choices`",
                    self.speaker
                )));
            }
        };
        match (&self.charmod, &self.restyle) {
            (Some(_), Some(_)) => {
                return Err(DialogError::InvalidItem(format!(
                    "speech of '{}' sets both `charmod` and `restyle`",
                    self.speaker
                )));
            }
            (Some(name), None) => speech = speech.named_mod(name.clone()),
            (None, Some(patch)) => speech = speech.restyle(patch.clone()),
            (None, None) => {}
        }
        Ok(speech)
    }
}

impl LineDoc {
    fn to_line(&self) -> Line {
        let t = match self {
            LineDoc::Text(text) => return Line::new(text.clone()),
            LineDoc::Full(t) => t,
        };
        let mut line = Line::new(t.text.clone()).active(t.active);
        if let Some(target) = &t.branch {
            line = line.branch(target.clone());
        }
        line.time = t.time;
        line.time_factor = t.time_factor;
        line.ctime = t.ctime.clone();
        line.ctime_factor = t.ctime_factor;
        line.font = t.font.clone();
        if let Some(voice) = &t.voice {
            line = line.voice(voice.clone(), t.volume.unwrap_or(1.0));
        }
        line
    }
}

impl StageDoc {
    fn to_change(&self) -> StageChange {
        let mut change = match &self.speakers {
            Some(ids) => StageChange::of(ids.iter().cloned()),
            None => StageChange::all(),
        };
        change.transition = self.transition;
        change.ctime = self.ctime.clone();
        change
    }
}
