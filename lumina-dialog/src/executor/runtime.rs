use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use lumina_ui::{Rect, Vec2};

use crate::autoplace::{Autoplacer, Move};
use crate::config::{DialogConfig, LayoutConfig};
use crate::error::{DialogError, Result};
use crate::host::{DecoId, DecoSpec, Host};
use crate::script::{Character, CharacterId, CharacterMod, ModRef, UpdateChar, WorldAnchor};

pub(crate) type ContextId = u64;

pub(crate) const INPUT_GROUP: &str = "dialog";
pub(crate) const CHOICE_GROUP: &str = "dialog-choice";

/// Visual shell of one speaker for the duration of a run.
#[derive(Debug)]
pub(crate) struct Deco {
    pub id: DecoId,
    /// Line contexts currently speaking through this deco.
    pub talking: Vec<ContextId>,
    pub bounds: Option<Rect>,
    pub highlight: Option<f32>,
    pub last_screen_pos: Vec2,
}

/// Live state shared by every item context of a run.
pub(crate) struct Runtime {
    pub host: Host,
    pub config: DialogConfig,
    /// Character keys in declaration order.
    pub order: Vec<CharacterId>,
    base: FxHashMap<CharacterId, Character>,
    pub mods: FxHashMap<String, CharacterMod>,
    pub chars: FxHashMap<CharacterId, Character>,
    pub decos: FxHashMap<CharacterId, Deco>,
    pub autoplacer: Autoplacer,
    /// Speakers put on stage implicitly, with whether they are still talking.
    pub auto_entered: FxHashMap<CharacterId, bool>,
    pub rng: StdRng,
    next_context: ContextId,
}

impl Runtime {
    pub fn new(
        host: Host,
        config: DialogConfig,
        characters: Vec<(CharacterId, Character)>,
        mods: FxHashMap<String, CharacterMod>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let order = characters.iter().map(|(id, _)| id.clone()).collect();
        let base: FxHashMap<_, _> = characters.into_iter().collect();
        Self {
            host,
            autoplacer: Autoplacer::new(&config.layout),
            config,
            order,
            chars: base.clone(),
            base,
            mods,
            decos: FxHashMap::default(),
            auto_entered: FxHashMap::default(),
            rng,
            next_context: 0,
        }
    }

    pub fn next_context_id(&mut self) -> ContextId {
        self.next_context += 1;
        self.next_context
    }

    /// Builds every speaker's deco, hidden until an entry shows it.
    pub fn setup(&mut self) -> Result<()> {
        self.chars = self.base.clone();
        for id in self.order.clone() {
            let spec = self.deco_spec(&id, self.character(&id)?)?;
            let deco = self.host.presenter.create_deco(&spec);
            self.decos.insert(id, Deco {
                id: deco,
                talking: Vec::new(),
                bounds: None,
                highlight: None,
                last_screen_pos: Vec2::ZERO,
            });
        }
        let input = &self.config.input;
        self.host.input.bind(INPUT_GROUP, &input.skip_trigger, input.priority);
        self.host.input.bind(INPUT_GROUP, &input.end_trigger, input.priority);
        self.update_highlights();
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.host.input.unbind_group(CHOICE_GROUP);
        self.host.input.unbind_group(INPUT_GROUP);
        for id in &self.order {
            if let Some(deco) = self.decos.remove(id) {
                self.host.presenter.release_deco(deco.id);
            }
        }
        self.autoplacer.clear();
        self.auto_entered.clear();
    }

    pub fn character(&self, id: &str) -> Result<&Character> {
        self.chars
            .get(id)
            .ok_or_else(|| DialogError::UnknownCharacter(id.to_string()))
    }

    pub fn deco(&mut self, id: &str) -> Result<&mut Deco> {
        self.decos
            .get_mut(id)
            .ok_or_else(|| DialogError::UnknownCharacter(id.to_string()))
    }

    pub fn is_autoplaced(&self, ch: &Character) -> bool {
        ch.autoplace
            .unwrap_or(ch.world_anchor.is_some() && self.config.autoplace)
    }

    /// Live profile of `id` with a per-speech restyle applied. Auto-placed
    /// speakers keep their profile so the stack does not jump.
    pub fn resolve(&self, id: &str, charmod: Option<&ModRef>) -> Result<Character> {
        let ch = self.character(id)?;
        let patch = match charmod {
            Some(_) if self.is_autoplaced(ch) => None,
            Some(ModRef::Inline(m)) => Some(m),
            Some(ModRef::Named(name)) => Some(
                self.mods
                    .get(name)
                    .ok_or_else(|| DialogError::UnknownCharacterMod(name.clone()))?,
            ),
            None => None,
        };
        Ok(match patch {
            Some(m) => ch.supplement(m),
            None => ch.clone(),
        })
    }

    pub fn deco_spec(&self, id: &str, ch: &Character) -> Result<DecoSpec> {
        let cfg = &self.config;
        let (portrait, portrait_size) = match (&ch.portrait, self.is_autoplaced(ch)) {
            (Some(p), _) => (
                Some(p.clone()),
                ch.portrait_size.resolve(&cfg.named_portrait_sizes, "portrait size")?,
            ),
            (None, true) => (cfg.autoplace_portrait.clone(), cfg.autoplace_portrait_size),
            (None, false) => (None, 0.0),
        };
        let portrait = portrait.map(|p| {
            if p.contains('/') { p } else { format!("images/portraits/{}", p) }
        });
        Ok(DecoSpec {
            speaker: id.to_string(),
            name: ch.short_name.clone().or_else(|| ch.long_name.clone()),
            portrait,
            portrait_size,
            color: ch.color,
        })
    }

    /// Applies a character update for the rest of the run.
    pub fn update_char(&mut self, update: &UpdateChar) -> Result<()> {
        let ch = self.character(&update.speaker)?.supplement(&update.charmod);
        let spec = self.deco_spec(&update.speaker, &ch)?;
        let deco = self.deco(&update.speaker)?;
        deco.bounds = None;
        let deco_id = deco.id;
        self.host.presenter.rebuild_deco(deco_id, &spec);
        self.chars.insert(update.speaker.clone(), ch);
        log::debug!("Updated character '{}'", update.speaker);
        Ok(())
    }

    pub fn bounds(&mut self, id: &str) -> Result<Rect> {
        let Runtime { decos, host, .. } = self;
        let deco = decos
            .get_mut(id)
            .ok_or_else(|| DialogError::UnknownCharacter(id.to_string()))?;
        let deco_id = deco.id;
        Ok(*deco.bounds.get_or_insert_with(|| host.presenter.deco_bounds(deco_id)))
    }

    pub fn invalidate_bounds(&mut self, id: &str) {
        if let Some(deco) = self.decos.get_mut(id) {
            deco.bounds = None;
        }
    }

    pub fn start_talking(&mut self, id: &str, ctx: ContextId) -> Result<()> {
        self.deco(id)?.talking.push(ctx);
        if let Some(talking) = self.auto_entered.get_mut(id) {
            *talking = true;
        }
        self.update_highlights();
        Ok(())
    }

    pub fn stop_talking(&mut self, id: &str, ctx: ContextId) {
        if let Some(deco) = self.decos.get_mut(id) {
            deco.talking.retain(|c| *c != ctx);
        }
        if let Some(talking) = self.auto_entered.get_mut(id) {
            *talking = false;
        }
        self.update_highlights();
    }

    /// Full alpha for decos with a talking context, dimmed for the rest.
    pub fn update_highlights(&mut self) {
        let timing = &self.config.timing;
        for id in &self.order {
            let Some(deco) = self.decos.get_mut(id) else { continue };
            let to = if deco.talking.is_empty() { timing.silent_alpha } else { 1.0 };
            if deco.highlight == Some(to) {
                continue;
            }
            let duration = if deco.highlight.is_some() { timing.silent_fade_time } else { 0.0 };
            deco.highlight = Some(to);
            self.host.presenter.highlight_deco(deco.id, to, duration);
        }
    }

    /// Re-stacks auto-placed decos below the top-left screen corner.
    pub fn layout(&mut self) {
        if self.autoplacer.is_empty() {
            return;
        }
        let vp = self.host.presenter.viewport();
        let origin = Vec2::new(vp.x, vp.top());
        let played_anchor = self
            .order
            .iter()
            .filter_map(|id| self.chars.get(id))
            .find(|c| c.played)
            .and_then(|c| c.world_anchor.clone());

        let Runtime { autoplacer, decos, chars, host, config, .. } = self;
        let moves = autoplacer.layout(origin, |id| {
            let prio = chars
                .get(id)
                .map(|c| priority(c, played_anchor.as_ref(), &config.layout))
                .unwrap_or(0);
            let bounds = match decos.get_mut(id) {
                Some(d) => {
                    let deco_id = d.id;
                    *d.bounds.get_or_insert_with(|| host.presenter.deco_bounds(deco_id))
                }
                None => Rect::new(0.0, 0.0, 0.0, 0.0),
            };
            (prio, bounds)
        });
        for p in moves {
            let Some(deco) = decos.get(&p.id) else { continue };
            match p.mv {
                Move::Snap => host.presenter.place_deco(deco.id, p.pos),
                Move::Slide(duration) => host.presenter.slide_deco(deco.id, p.pos, duration),
            }
        }
    }
}

/// Explicit priority, else high for the played character and elevated for
/// whoever shares the played character's world anchor.
pub(crate) fn priority(ch: &Character, played_anchor: Option<&WorldAnchor>, cfg: &LayoutConfig) -> i32 {
    if let Some(prio) = ch.autoplace_priority {
        return prio;
    }
    if ch.played {
        cfg.played_priority
    } else if ch.world_anchor.is_some() && ch.world_anchor.as_ref() == played_anchor {
        cfg.addressed_priority
    } else {
        0
    }
}
