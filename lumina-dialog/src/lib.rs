//! Branching dialogue playback: a frame-stepped cooperative scheduler for
//! speeches, pauses, stage entries/exits and character updates, with
//! per-speaker bubbles laid out automatically when they have no fixed place.

pub mod error;
pub mod config;
pub mod event;
pub mod host;
pub mod script;
pub mod timing;
pub mod unfold;
pub mod autoplace;
pub mod registry;
pub mod executor;

pub use error::{DialogError, Result};
pub use config::DialogConfig;
pub use event::DialogEvent;
pub use executor::{Dialog, DialogBuilder, Step};
pub use host::{Clock, FixedClock, Host, WallClock};
pub use registry::DialogRegistry;
pub use script::{
    Cast, Character, CharacterId, CharacterMod, Cond, Hook, Item, Line, ModRef, Named, Pause,
    Predicate, Script, Speech, StageChange, Transition, UpdateChar, Utterance, WorldAnchor,
};
