use crate::error::Result;
use crate::executor::Step;
use crate::executor::choice::ChoiceState;
use crate::executor::line::LineState;
use crate::executor::pause::PauseState;
use crate::executor::runtime::{ContextId, Runtime};
use crate::executor::stage::StageState;

pub(crate) enum ItemState {
    Line(Box<LineState>),
    Choice(ChoiceState),
    Pause(PauseState),
    Stage(StageState),
}

/// One in-flight item.
pub(crate) struct ItemContext {
    pub id: ContextId,
    pub state: ItemState,
    /// Set by a skip request, consumed by the next update.
    pub skip: bool,
    jump_sent: bool,
}

impl ItemContext {
    pub fn new(id: ContextId, state: ItemState) -> Self {
        Self { id, state, skip: false, jump_sent: false }
    }

    pub fn skippable(&self) -> bool {
        match &self.state {
            ItemState::Line(l) => l.skippable(),
            ItemState::Choice(c) => c.skippable(),
            ItemState::Pause(_) => true,
            ItemState::Stage(_) => false,
        }
    }

    fn jump_target(&self) -> Option<&str> {
        match &self.state {
            ItemState::Line(l) => l.jump_target(),
            ItemState::Choice(c) => c.jump_target(),
            ItemState::Pause(p) => p.jump_target(),
            ItemState::Stage(_) => None,
        }
    }

    pub fn update(&mut self, rt: &mut Runtime, dt: f32) -> Result<Step> {
        let skip = std::mem::take(&mut self.skip);
        let id = self.id;
        let (finished, proceed) = match &mut self.state {
            ItemState::Line(l) => l.update(rt, id, dt, skip)?,
            ItemState::Choice(c) => c.update(rt, id, dt, skip)?,
            ItemState::Pause(p) => p.update(dt, skip),
            ItemState::Stage(s) => s.update(rt, dt, skip)?,
        };

        // a jump is requested once, as soon as the item lets the run move on
        let mut jump_to = None;
        if !self.jump_sent && (finished || proceed) {
            if let Some(target) = self.jump_target() {
                jump_to = Some(target.to_string());
                self.jump_sent = true;
            }
        }
        Ok(Step { finished, proceed, jump_to })
    }

    pub fn select(&mut self, index: usize) -> bool {
        match &mut self.state {
            ItemState::Choice(c) => c.select(index),
            _ => false,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(&self.state, ItemState::Choice(c) if c.is_selecting())
    }

    pub fn release(&mut self, rt: &mut Runtime) {
        let id = self.id;
        match &mut self.state {
            ItemState::Line(l) => l.release(rt, id),
            ItemState::Choice(c) => c.release(rt, id),
            ItemState::Pause(_) | ItemState::Stage(_) => {}
        }
    }
}
