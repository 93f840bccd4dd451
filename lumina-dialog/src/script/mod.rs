mod character;
mod line;
pub mod loader;

use std::collections::HashMap;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DialogError, Result};

pub use character::{Character, CharacterId, CharacterMod, WorldAnchor};
pub use line::{Cond, Hook, Line, Pause, Predicate};
pub(crate) use line::fire;

pub const START_BRANCH: &str = "start";

/// A literal value or the name of a preset in one of the dialogue's named tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Named<T> {
    Value(T),
    Name(String),
}

impl<T: Copy> Named<T> {
    pub fn resolve(&self, table: &HashMap<String, T>, kind: &'static str) -> Result<T> {
        match self {
            Named::Value(v) => Ok(*v),
            Named::Name(name) => table
                .get(name)
                .copied()
                .ok_or_else(|| DialogError::UnknownNamed { kind, name: name.clone() }),
        }
    }
}

impl<T> From<T> for Named<T> {
    fn from(v: T) -> Self {
        Named::Value(v)
    }
}

/// A single line, or alternatives of which exactly one is played.
#[derive(Clone, Debug)]
pub enum Utterance {
    Single(Rc<Line>),
    Choice(Vec<Rc<Line>>),
}

/// Per-speech restyle: inline, or the key of a named character mod.
#[derive(Clone, Debug)]
pub enum ModRef {
    Named(String),
    Inline(CharacterMod),
}

#[derive(Clone, Debug)]
pub struct Speech {
    pub speaker: CharacterId,
    pub utterance: Utterance,
    pub charmod: Option<ModRef>,
}

impl Speech {
    pub fn new(speaker: impl Into<CharacterId>, line: Line) -> Self {
        Self {
            speaker: speaker.into(),
            utterance: Utterance::Single(Rc::new(line)),
            charmod: None,
        }
    }

    pub fn choice(speaker: impl Into<CharacterId>, lines: Vec<Line>) -> Self {
        Self {
            speaker: speaker.into(),
            utterance: Utterance::Choice(lines.into_iter().map(Rc::new).collect()),
            charmod: None,
        }
    }

    pub fn restyle(mut self, patch: CharacterMod) -> Self {
        self.charmod = Some(ModRef::Inline(patch));
        self
    }

    pub fn named_mod(mut self, name: impl Into<String>) -> Self {
        self.charmod = Some(ModRef::Named(name.into()));
        self
    }

    fn lines(&self) -> impl Iterator<Item = &Line> {
        let lines: &[Rc<Line>] = match &self.utterance {
            Utterance::Single(l) => std::slice::from_ref(l),
            Utterance::Choice(ls) => ls,
        };
        lines.iter().map(|l| l.as_ref())
    }
}

/// Who an entry or exit applies to.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cast {
    #[default]
    All,
    Only(Vec<CharacterId>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Instant,
    Fade,
}

/// Payload shared by [`Item::Entry`] and [`Item::Exit`].
#[derive(Clone, Debug, Default)]
pub struct StageChange {
    pub cast: Cast,
    pub transition: Transition,
    pub ctime: Option<Named<f32>>,
    pub on_start: Vec<Hook>,
    pub on_end: Vec<Hook>,
}

impl StageChange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of<S: Into<CharacterId>>(speakers: impl IntoIterator<Item = S>) -> Self {
        Self {
            cast: Cast::Only(speakers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn fade(mut self) -> Self {
        self.transition = Transition::Fade;
        self
    }

    pub fn ctime(mut self, secs: f32) -> Self {
        self.ctime = Some(Named::Value(secs));
        self
    }

    pub fn named_ctime(mut self, name: impl Into<String>) -> Self {
        self.ctime = Some(Named::Name(name.into()));
        self
    }

    pub fn on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start.push(Hook::new(f));
        self
    }

    pub fn on_end(mut self, f: impl Fn() + 'static) -> Self {
        self.on_end.push(Hook::new(f));
        self
    }
}

#[derive(Clone, Debug)]
pub struct UpdateChar {
    pub speaker: CharacterId,
    pub charmod: CharacterMod,
}

#[derive(Clone, Debug)]
pub enum Item {
    Speech(Speech),
    Pause(Pause),
    Entry(StageChange),
    Exit(StageChange),
    UpdateChar(UpdateChar),
}

impl Item {
    pub fn say(speaker: impl Into<CharacterId>, line: Line) -> Self {
        Item::Speech(Speech::new(speaker, line))
    }

    pub fn choice(speaker: impl Into<CharacterId>, lines: Vec<Line>) -> Self {
        Item::Speech(Speech::choice(speaker, lines))
    }

    pub fn pause(secs: f32) -> Self {
        Item::Pause(Pause::new(secs))
    }

    pub fn update(speaker: impl Into<CharacterId>, charmod: CharacterMod) -> Self {
        Item::UpdateChar(UpdateChar { speaker: speaker.into(), charmod })
    }

    fn jump_targets(&self) -> Vec<&str> {
        match self {
            Item::Speech(s) => s.lines().filter_map(|l| l.branch.as_deref()).collect(),
            Item::Pause(p) => p.branch.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Speech> for Item {
    fn from(s: Speech) -> Self {
        Item::Speech(s)
    }
}

impl From<Pause> for Item {
    fn from(p: Pause) -> Self {
        Item::Pause(p)
    }
}

/// Validated, immutable branch table.
#[derive(Debug)]
pub struct Script {
    branches: FxHashMap<String, Rc<[Item]>>,
}

impl Script {
    pub fn new<S: Into<String>>(branches: impl IntoIterator<Item = (S, Vec<Item>)>) -> Result<Self> {
        let mut map: FxHashMap<String, Rc<[Item]>> = FxHashMap::default();
        for (name, items) in branches {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(DialogError::DuplicateKey { kind: "branch", name });
            }
            map.insert(name, Rc::from(items));
        }

        if !map.contains_key(START_BRANCH) {
            return Err(DialogError::MissingStartBranch);
        }
        for items in map.values() {
            for item in items.iter() {
                if let Item::Speech(s) = item {
                    for line in s.lines() {
                        line.validate()?;
                    }
                }
                for target in item.jump_targets() {
                    if !map.contains_key(target) {
                        return Err(DialogError::UnknownBranch(target.to_string()));
                    }
                }
            }
        }
        Ok(Self { branches: map })
    }

    /// Script with only a `start` branch.
    pub fn linear(items: Vec<Item>) -> Result<Self> {
        Self::new([(START_BRANCH, items)])
    }

    pub fn branch(&self, name: &str) -> Option<Rc<[Item]>> {
        self.branches.get(name).cloned()
    }

    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(|k| k.as_str())
    }

    /// Every character key named anywhere in the script.
    pub(crate) fn speakers(&self) -> impl Iterator<Item = &str> {
        self.branches.values().flat_map(|items| {
            items.iter().flat_map(|item| -> Vec<&str> {
                match item {
                    Item::Speech(s) => vec![s.speaker.as_str()],
                    Item::UpdateChar(u) => vec![u.speaker.as_str()],
                    Item::Entry(sc) | Item::Exit(sc) => match &sc.cast {
                        Cast::All => Vec::new(),
                        Cast::Only(ids) => ids.iter().map(|s| s.as_str()).collect(),
                    },
                    Item::Pause(_) => Vec::new(),
                }
            })
        })
    }

    /// Every named character mod referenced by a speech.
    pub(crate) fn named_mods(&self) -> impl Iterator<Item = &str> {
        self.branches.values().flat_map(|items| {
            items.iter().filter_map(|item| match item {
                Item::Speech(Speech { charmod: Some(ModRef::Named(n)), .. }) => Some(n.as_str()),
                _ => None,
            })
        })
    }
}
