mod choice;
mod context;
mod cursor;
mod line;
mod pause;
mod runtime;
mod stage;

use std::rc::Rc;
use rustc_hash::{FxHashMap, FxHashSet};
use lumina_ui::Vec2;

use crate::config::DialogConfig;
use crate::error::{DialogError, Result};
use crate::host::{Clock, Host};
use crate::registry::{DialogRegistry, RunTicket};
use crate::script::{
    Cast, Character, CharacterId, CharacterMod, Item, Script, Speech, StageChange,
    Utterance, START_BRANCH,
};

use choice::ChoiceState;
use context::{ItemContext, ItemState};
use cursor::Cursor;
use line::LineState;
use pause::PauseState;
use runtime::{ContextId, Runtime, CHOICE_GROUP, INPUT_GROUP};
use stage::{Direction, StageState};

/// Result of advancing one item by one time step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    /// The item is fully done and can be dropped.
    pub finished: bool,
    /// The next item may open, even if this one is still finishing.
    pub proceed: bool,
    pub jump_to: Option<String>,
}

struct Run {
    cursor: Cursor,
    contexts: Vec<ItemContext>,
    proceeded: FxHashSet<ContextId>,
    on_stage: FxHashSet<CharacterId>,
    ticket: Option<RunTicket>,
}

impl Run {
    /// Honored only once the current branch has opened an item.
    fn jump(&mut self, script: &Script, target: &str) -> Result<bool> {
        if self.cursor.pc == 0 {
            log::debug!("Ignoring jump to '{}' at the head of '{}'", target, self.cursor.branch);
            return Ok(false);
        }
        let items = script
            .branch(target)
            .ok_or_else(|| DialogError::UnknownBranch(target.to_string()))?;
        log::info!("Jumping from '{}' to '{}'", self.cursor.branch, target);
        self.cursor = Cursor::new(target, items);
        Ok(true)
    }
}

/// One playable dialogue: a script, its characters and the live run.
pub struct Dialog {
    script: Rc<Script>,
    rt: Runtime,
    registry: Option<DialogRegistry>,
    run: Option<Run>,
}

impl Dialog {
    pub fn builder(script: impl Into<Rc<Script>>) -> DialogBuilder {
        DialogBuilder::new(script.into())
    }

    /// Starts from the `start` branch, restarting if already running.
    pub fn start(&mut self) -> Result<()> {
        self.stop();
        let items = self.script.branch(START_BRANCH).ok_or(DialogError::MissingStartBranch)?;
        if let Err(e) = self.rt.setup() {
            self.rt.teardown();
            return Err(e);
        }
        self.run = Some(Run {
            cursor: Cursor::new(START_BRANCH, items),
            contexts: Vec::new(),
            proceeded: FxHashSet::default(),
            on_stage: FxHashSet::default(),
            ticket: self.registry.as_ref().map(|r| r.register()),
        });
        log::info!("Dialog started with {} character(s)", self.rt.order.len());
        Ok(())
    }

    /// Tears the run down: item contexts, decos, input bindings and sounds.
    pub fn stop(&mut self) {
        let Some(mut run) = self.run.take() else { return };
        for ctx in run.contexts.iter_mut() {
            ctx.release(&mut self.rt);
        }
        self.rt.teardown();
        log::info!("Dialog stopped in branch '{}'", run.cursor.branch);
    }

    pub fn in_progress(&self) -> bool {
        match &self.run {
            Some(run) => !run.ticket.as_ref().is_some_and(|t| t.is_cancelled()),
            None => false,
        }
    }

    pub fn tick(&mut self, clock: &mut dyn Clock) -> Result<()> {
        let dt = clock.dt();
        self.advance(dt)
    }

    /// Advances the run by `dt` seconds. A configuration error stops the
    /// run and is returned.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        let Some(run) = self.run.as_ref() else { return Ok(()) };
        if run.ticket.as_ref().is_some_and(|t| t.is_cancelled()) {
            log::warn!("Dialog cancelled by its registry");
            self.stop();
            return Ok(());
        }
        if !self.rt.host.presenter.is_alive() {
            log::warn!("Dialog root is gone, stopping");
            self.stop();
            return Ok(());
        }

        self.poll_input();
        let Some(run) = self.run.as_mut() else { return Ok(()) };
        log::trace!("Dialog frame dt={:.4} contexts={}", dt, run.contexts.len());

        match frame(&self.script, run, &mut self.rt, dt) {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.stop();
                Ok(())
            }
            Err(e) => {
                log::error!("Dialog aborted: {}", e);
                self.stop();
                Err(e)
            }
        }
    }

    /// Requests a skip. Honored when the dialogue allows skipping or every
    /// active item is skippable.
    pub fn skip(&mut self) -> bool {
        let Some(run) = self.run.as_mut() else { return false };
        let allowed = self.rt.config.can_skip || run.contexts.iter().all(|c| c.skippable());
        if allowed {
            for ctx in run.contexts.iter_mut() {
                ctx.skip = true;
            }
        }
        allowed
    }

    /// Stops the run early if the dialogue allows it.
    pub fn end(&mut self) -> bool {
        if !self.rt.config.can_end || self.run.is_none() {
            return false;
        }
        log::info!("Dialog ended early");
        self.stop();
        true
    }

    /// Picks alternative `index` (zero based) of the menu being shown.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(run) = self.run.as_mut() else { return false };
        run.contexts
            .iter_mut()
            .find(|c| c.is_selecting())
            .is_some_and(|c| c.select(index))
    }

    pub fn is_choosing(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|r| r.contexts.iter().any(|c| c.is_selecting()))
    }

    /// Speakers currently on stage, sorted.
    pub fn on_stage(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .run
            .as_ref()
            .map(|r| r.on_stage.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn current_branch(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.cursor.branch.as_str())
    }

    pub fn active_items(&self) -> usize {
        self.run.as_ref().map(|r| r.contexts.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &DialogConfig {
        &self.rt.config
    }

    /// Live profile, including updates applied during the run.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.rt.chars.get(id)
    }

    fn poll_input(&mut self) {
        let pressed = self.rt.host.input.take_pressed(INPUT_GROUP);
        for trigger in pressed {
            if trigger == self.rt.config.input.skip_trigger {
                self.skip();
            } else if trigger == self.rt.config.input.end_trigger {
                self.end();
            }
        }
        let picks = self.rt.host.input.take_pressed(CHOICE_GROUP);
        for trigger in picks {
            if let Some(n) = trigger.parse::<usize>().ok().filter(|n| *n > 0) {
                self.select(n - 1);
            }
        }
    }
}

impl Drop for Dialog {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One frame. Returns false once the run is over.
fn frame(script: &Script, run: &mut Run, rt: &mut Runtime, dt: f32) -> Result<bool> {
    // 1. update everything in flight
    let mut i = 0;
    while i < run.contexts.len() {
        let step = run.contexts[i].update(rt, dt)?;
        let id = run.contexts[i].id;
        if step.finished {
            run.contexts.remove(i);
            run.proceeded.remove(&id);
        } else {
            if step.proceed {
                run.proceeded.insert(id);
            }
            i += 1;
        }
        if let Some(target) = step.jump_to {
            run.jump(script, &target)?;
        }
    }

    // 2-3. open items while nothing holds the run back
    let may_open = run.contexts.iter().all(|c| run.proceeded.contains(&c.id));
    if may_open {
        open_items(script, run, rt)?;
    }
    if run.cursor.is_exhausted() && run.contexts.is_empty() {
        log::debug!("Branch '{}' exhausted", run.cursor.branch);
        return Ok(false);
    }

    // 4. implicit exits for implicit entries that went quiet
    let mut quiet: Vec<CharacterId> = rt
        .auto_entered
        .iter()
        .filter(|(_, talking)| !**talking)
        .map(|(id, _)| id.clone())
        .collect();
    if !quiet.is_empty() {
        quiet.sort();
        for id in &quiet {
            run.on_stage.remove(id);
            rt.auto_entered.remove(id);
        }
        let mut ctx = ItemContext::new(
            rt.next_context_id(),
            ItemState::Stage(StageState::implicit(Direction::Exit, quiet)),
        );
        let step = ctx.update(rt, 0.0)?;
        if !step.finished {
            run.contexts.push(ctx);
        }
    }

    // 5.
    rt.layout();
    Ok(true)
}

fn open_items(script: &Script, run: &mut Run, rt: &mut Runtime) -> Result<()> {
    loop {
        let items = run.cursor.items();
        let Some(item) = items.get(run.cursor.pc) else { return Ok(()) };

        let state = match item {
            Item::Speech(speech) if !run.on_stage.contains(&speech.speaker) => {
                let speaker = speech.speaker.clone();
                let auto = rt.is_autoplaced(rt.character(&speaker)?);
                if auto {
                    rt.auto_entered.insert(speaker.clone(), true);
                }
                run.on_stage.insert(speaker.clone());
                log::debug!("Implicit entry of '{}'", speaker);
                Some(ItemState::Stage(StageState::implicit(Direction::Entry, vec![speaker])))
            }
            Item::Speech(speech) => {
                run.cursor.advance();
                open_speech(rt, speech)?
            }
            Item::Pause(pause) => {
                run.cursor.advance();
                Some(ItemState::Pause(PauseState::new(pause.clone())))
            }
            Item::Entry(change) => {
                run.cursor.advance();
                let speakers: Vec<CharacterId> = cast(rt, change)
                    .into_iter()
                    .filter(|s| run.on_stage.insert(s.clone()))
                    .collect();
                Some(ItemState::Stage(stage_state(rt, Direction::Entry, speakers, change)?))
            }
            Item::Exit(change) => {
                run.cursor.advance();
                let speakers: Vec<CharacterId> = cast(rt, change)
                    .into_iter()
                    .filter(|s| {
                        rt.auto_entered.remove(s);
                        run.on_stage.remove(s)
                    })
                    .collect();
                Some(ItemState::Stage(stage_state(rt, Direction::Exit, speakers, change)?))
            }
            Item::UpdateChar(update) => {
                run.cursor.advance();
                rt.update_char(update)?;
                None
            }
        };
        let Some(state) = state else { continue };

        let mut ctx = ItemContext::new(rt.next_context_id(), state);
        let step = ctx.update(rt, 0.0)?;
        let persists = !step.finished;
        if persists {
            if step.proceed {
                run.proceeded.insert(ctx.id);
            }
            run.contexts.push(ctx);
        }
        if let Some(target) = step.jump_to {
            run.jump(script, &target)?;
            return Ok(());
        }
        if persists {
            return Ok(());
        }
    }
}

fn open_speech(rt: &mut Runtime, speech: &Speech) -> Result<Option<ItemState>> {
    let charmod = speech.charmod.as_ref();
    match &speech.utterance {
        Utterance::Single(line) => {
            if !line.cond.holds() {
                log::debug!("Inactive line of '{}' skipped", speech.speaker);
                return Ok(None);
            }
            let state = LineState::open(rt, &speech.speaker, line.clone(), charmod)?;
            Ok(Some(ItemState::Line(Box::new(state))))
        }
        Utterance::Choice(lines) => {
            Ok(choice::open(rt, &speech.speaker, lines, charmod)?.map(ItemState::Choice))
        }
    }
}

fn cast(rt: &Runtime, change: &StageChange) -> Vec<CharacterId> {
    match &change.cast {
        Cast::All => rt.order.clone(),
        Cast::Only(ids) => ids.clone(),
    }
}

fn stage_state(
    rt: &Runtime,
    direction: Direction,
    speakers: Vec<CharacterId>,
    change: &StageChange,
) -> Result<StageState> {
    let cont = change
        .ctime
        .as_ref()
        .map(|c| c.resolve(&rt.config.named_ctimes, "continuation time"))
        .transpose()?;
    log::debug!("{:?} of {:?}", direction, speakers);
    Ok(StageState::new(
        direction,
        speakers,
        change.transition,
        cont,
        change.on_start.clone(),
        change.on_end.clone(),
    ))
}

/// Assembles a [`Dialog`] and checks the script against its characters.
pub struct DialogBuilder {
    script: Rc<Script>,
    config: DialogConfig,
    characters: Vec<(CharacterId, Character)>,
    mods: Vec<(String, CharacterMod)>,
    named_positions: Vec<(String, Vec2)>,
    named_sizes: Vec<(String, f32)>,
    named_widths: Vec<(String, f32)>,
    named_portrait_sizes: Vec<(String, f32)>,
    named_ctimes: Vec<(String, f32)>,
    registry: Option<DialogRegistry>,
    host: Option<Host>,
}

impl DialogBuilder {
    fn new(script: Rc<Script>) -> Self {
        Self {
            script,
            config: DialogConfig::from_shared(),
            characters: Vec::new(),
            mods: Vec::new(),
            named_positions: Vec::new(),
            named_sizes: Vec::new(),
            named_widths: Vec::new(),
            named_portrait_sizes: Vec::new(),
            named_ctimes: Vec::new(),
            registry: None,
            host: None,
        }
    }

    pub fn config(mut self, config: DialogConfig) -> Self {
        self.config = config;
        self
    }

    /// Layers per-dialogue option overrides over the current config.
    pub fn options(mut self, overrides: &toml::Table) -> Result<Self> {
        self.config = self.config.with_overrides(overrides)?;
        Ok(self)
    }

    pub fn character(mut self, id: impl Into<CharacterId>, ch: Character) -> Self {
        self.characters.push((id.into(), ch));
        self
    }

    pub fn character_mod(mut self, name: impl Into<String>, m: CharacterMod) -> Self {
        self.mods.push((name.into(), m));
        self
    }

    pub fn named_position(mut self, name: impl Into<String>, pos: Vec2) -> Self {
        self.named_positions.push((name.into(), pos));
        self
    }

    pub fn named_size(mut self, name: impl Into<String>, size: f32) -> Self {
        self.named_sizes.push((name.into(), size));
        self
    }

    pub fn named_width(mut self, name: impl Into<String>, width: f32) -> Self {
        self.named_widths.push((name.into(), width));
        self
    }

    pub fn named_portrait_size(mut self, name: impl Into<String>, size: f32) -> Self {
        self.named_portrait_sizes.push((name.into(), size));
        self
    }

    pub fn named_ctime(mut self, name: impl Into<String>, secs: f32) -> Self {
        self.named_ctimes.push((name.into(), secs));
        self
    }

    pub fn can_skip(mut self, on: bool) -> Self {
        self.config.can_skip = on;
        self
    }

    pub fn can_end(mut self, on: bool) -> Self {
        self.config.can_end = on;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn registry(mut self, registry: &DialogRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build(self) -> Result<Dialog> {
        let mut config = self.config;
        config.named_positions.extend(self.named_positions);
        config.named_sizes.extend(self.named_sizes);
        config.named_widths.extend(self.named_widths);
        config.named_portrait_sizes.extend(self.named_portrait_sizes);
        config.named_ctimes.extend(self.named_ctimes);

        let mut seen = FxHashSet::default();
        for (id, ch) in &self.characters {
            if !seen.insert(id.as_str()) {
                return Err(DialogError::DuplicateKey { kind: "character", name: id.clone() });
            }
            check_named(ch, &config)?;
        }
        let mut mods = FxHashMap::default();
        for (name, m) in self.mods {
            if mods.contains_key(&name) {
                return Err(DialogError::DuplicateKey { kind: "character mod", name });
            }
            mods.insert(name, m);
        }

        if let Some(unknown) = self.script.speakers().find(|s| !seen.contains(s)) {
            return Err(DialogError::UnknownCharacter(unknown.to_string()));
        }
        if let Some(unknown) = self.script.named_mods().find(|m| !mods.contains_key(*m)) {
            return Err(DialogError::UnknownCharacterMod(unknown.to_string()));
        }

        let host = self.host.unwrap_or_default();
        Ok(Dialog {
            rt: Runtime::new(host, config, self.characters, mods),
            script: self.script,
            registry: self.registry,
            run: None,
        })
    }
}

/// Named presets a character refers to must exist before the run starts.
fn check_named(ch: &Character, config: &DialogConfig) -> Result<()> {
    ch.pos.resolve(&config.named_positions, "position")?;
    ch.size.resolve(&config.named_sizes, "size")?;
    ch.width.resolve(&config.named_widths, "width")?;
    ch.portrait_size.resolve(&config.named_portrait_sizes, "portrait size")?;
    Ok(())
}
