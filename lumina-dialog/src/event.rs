use lumina_ui::Vec2;

/// What a run asked its host to do, in call order. Recorded by the headless
/// host and printed by the terminal player.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    DecoCreated { speaker: String },
    DecoRebuilt { speaker: String },
    DecoReleased { speaker: String },
    DecoFaded { speaker: String, alpha: f32, duration: f32 },
    Highlighted { speaker: String, alpha: f32, duration: f32 },
    Placed { speaker: String, pos: Vec2 },
    Slid { speaker: String, pos: Vec2, duration: f32 },

    TextCreated { speaker: String, text: String },
    TextChanged { speaker: String, text: String },
    TextShown { speaker: String, text: String },
    TextSwiped { speaker: String, cover: bool, duration: f32 },
    TextRemoved { speaker: String },

    ArrowShown { speaker: String, pos: Vec2, angle: f32 },
    ArrowHidden { speaker: String },

    MenuShown { options: Vec<String> },
    MenuRemoved,

    SoundPlayed { path: String },
    SoundStopped { path: String },
    SoundFaded { path: String, volume: f32, duration: f32 },

    Bound { group: String, trigger: String, priority: i32 },
    Unbound { group: String },
}

impl DialogEvent {
    pub fn speaker(&self) -> Option<&str> {
        use DialogEvent::*;
        match self {
            DecoCreated { speaker } | DecoRebuilt { speaker } | DecoReleased { speaker }
            | DecoFaded { speaker, .. } | Highlighted { speaker, .. } | Placed { speaker, .. }
            | Slid { speaker, .. } | TextCreated { speaker, .. } | TextChanged { speaker, .. }
            | TextShown { speaker, .. } | TextSwiped { speaker, .. } | TextRemoved { speaker }
            | ArrowShown { speaker, .. } | ArrowHidden { speaker } => Some(speaker),
            _ => None,
        }
    }
}
