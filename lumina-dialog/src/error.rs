use thiserror::Error;

/// Authoring and configuration errors. All of them are fatal to a run:
/// a dialogue that hits one is stopped and the error handed to the caller.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("named {kind} '{name}' not defined")]
    UnknownNamed { kind: &'static str, name: String },
    #[error("trying to jump to unknown branch '{0}'")]
    UnknownBranch(String),
    #[error("dialog script has no 'start' branch")]
    MissingStartBranch,
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("named character mod '{0}' not defined")]
    UnknownCharacterMod(String),
    #[error("duplicate {kind} '{name}'")]
    DuplicateKey { kind: &'static str, name: String },
    #[error("cannot set both {0} and {1}")]
    ConflictingTiming(&'static str, &'static str),
    #[error("invalid item: {0}")]
    InvalidItem(String),
    #[error(transparent)]
    Layout(#[from] lumina_ui::ParseLayoutError),
    #[error("script parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DialogError>;
