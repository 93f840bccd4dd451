use std::rc::Rc;
use rand::seq::SliceRandom;
use lumina_ui::Vec2;

use crate::error::Result;
use crate::executor::line::LineState;
use crate::executor::runtime::{ContextId, Runtime, CHOICE_GROUP};
use crate::host::{MenuEntry, MenuId};
use crate::script::{CharacterId, Line, ModRef};

pub(crate) enum ChoiceState {
    ToSelect {
        speaker: CharacterId,
        charmod: Option<ModRef>,
        lines: Vec<Rc<Line>>,
        menu: MenuId,
        selected: Option<usize>,
    },
    Selected(Box<LineState>),
}

/// Opens a speech with alternatives. `None` when no alternative is active.
pub(crate) fn open(
    rt: &mut Runtime,
    speaker: &str,
    lines: &[Rc<Line>],
    charmod: Option<&ModRef>,
) -> Result<Option<ChoiceState>> {
    let lines: Vec<Rc<Line>> = lines.iter().filter(|l| l.cond.holds()).cloned().collect();
    if lines.is_empty() {
        log::debug!("No active choice for '{}', skipping", speaker);
        return Ok(None);
    }

    let ch = rt.resolve(speaker, charmod)?;
    if !ch.played {
        let Some(line) = lines.choose(&mut rt.rng).cloned() else { return Ok(None) };
        let state = LineState::open(rt, speaker, line, charmod)?;
        return Ok(Some(ChoiceState::Selected(Box::new(state))));
    }

    let entries = menu_entries(rt, &lines);
    let menu = rt.host.presenter.show_menu(&entries);
    let priority = rt.config.input.priority;
    for i in 0..lines.len() {
        rt.host.input.bind(CHOICE_GROUP, &(i + 1).to_string(), priority);
    }
    log::debug!("Waiting for '{}' to pick one of {} lines", speaker, lines.len());
    Ok(Some(ChoiceState::ToSelect {
        speaker: speaker.to_string(),
        charmod: charmod.cloned(),
        lines,
        menu,
        selected: None,
    }))
}

/// Numbered rows stacked downwards, centered on the configured menu position.
fn menu_entries(rt: &Runtime, lines: &[Rc<Line>]) -> Vec<MenuEntry> {
    let cfg = &rt.config;
    let hw = rt.host.presenter.viewport().w * 0.5;
    let margin = 0.05 * hw;
    let box_w = cfg.choice_width.unwrap_or(hw - 2.0 * margin);
    let center_x = cfg.choice_x.unwrap_or(-hw + margin + box_w * 0.5);
    let row_h = cfg.choice_height * 1.05;
    let x = center_x - box_w * 0.5;
    let mut y = cfg.choice_y + lines.len() as f32 * row_h * 0.5;

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let entry = MenuEntry {
                label: format!("{}. {}", i + 1, line.text),
                pos: Vec2::new(x, y),
                width: box_w,
                height: cfg.choice_height,
                font: cfg.font.clone(),
                size: cfg.choice_size,
                color: cfg.choice_color,
            };
            y -= row_h;
            entry
        })
        .collect()
}

impl ChoiceState {
    pub fn select(&mut self, index: usize) -> bool {
        match self {
            ChoiceState::ToSelect { lines, selected, .. } if index < lines.len() => {
                *selected = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, ChoiceState::ToSelect { .. })
    }

    pub fn skippable(&self) -> bool {
        match self {
            ChoiceState::ToSelect { .. } => false,
            ChoiceState::Selected(line) => line.skippable(),
        }
    }

    pub fn jump_target(&self) -> Option<&str> {
        match self {
            ChoiceState::ToSelect { .. } => None,
            ChoiceState::Selected(line) => line.jump_target(),
        }
    }

    pub fn update(&mut self, rt: &mut Runtime, ctx: ContextId, dt: f32, skip: bool) -> Result<(bool, bool)> {
        if let ChoiceState::ToSelect { speaker, charmod, lines, menu, selected } = self {
            let Some(index) = *selected else { return Ok((false, false)) };
            rt.host.input.unbind_group(CHOICE_GROUP);
            rt.host.presenter.remove_menu(*menu);
            log::debug!("'{}' picked choice {}", speaker, index + 1);
            let state = LineState::open(rt, speaker, lines[index].clone(), charmod.as_ref())?;
            *self = ChoiceState::Selected(Box::new(state));
            // the pick itself is not skipped
            return self.update(rt, ctx, 0.0, false);
        }
        match self {
            ChoiceState::Selected(line) => line.update(rt, ctx, dt, skip),
            ChoiceState::ToSelect { .. } => Ok((false, false)),
        }
    }

    pub fn release(&mut self, rt: &mut Runtime, ctx: ContextId) {
        match self {
            ChoiceState::ToSelect { menu, .. } => rt.host.presenter.remove_menu(*menu),
            ChoiceState::Selected(line) => line.release(rt, ctx),
        }
    }
}
