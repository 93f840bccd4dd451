use crate::error::Result;
use crate::executor::runtime::Runtime;
use crate::script::{fire, CharacterId, Hook, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Loop,
    End,
}

/// Fades a set of speakers in or out.
pub(crate) struct StageState {
    direction: Direction,
    speakers: Vec<CharacterId>,
    transition: Transition,
    on_start: Vec<Hook>,
    on_end: Vec<Hook>,
    phase: Phase,
    wait: f32,
    cont: Option<f32>,
}

impl StageState {
    pub fn new(
        direction: Direction,
        speakers: Vec<CharacterId>,
        transition: Transition,
        cont: Option<f32>,
        on_start: Vec<Hook>,
        on_end: Vec<Hook>,
    ) -> Self {
        Self {
            direction,
            speakers,
            transition,
            on_start,
            on_end,
            phase: Phase::Start,
            wait: 0.0,
            cont,
        }
    }

    /// Implicit entry or exit with no transition.
    pub fn implicit(direction: Direction, speakers: Vec<CharacterId>) -> Self {
        Self::new(direction, speakers, Transition::Instant, Some(0.0), Vec::new(), Vec::new())
    }

    pub fn speakers(&self) -> &[CharacterId] {
        &self.speakers
    }

    pub fn update(&mut self, rt: &mut Runtime, dt: f32, skip: bool) -> Result<(bool, bool)> {
        if self.phase == Phase::Start {
            let (alpha, duration) = match (self.direction, self.transition) {
                (Direction::Entry, _) if skip => (1.0, 0.0),
                (Direction::Exit, _) if skip => (0.0, 0.0),
                (Direction::Entry, Transition::Instant) => (1.0, 0.0),
                (Direction::Entry, Transition::Fade) => (1.0, rt.config.timing.stage_fade_time),
                (Direction::Exit, Transition::Instant) => (0.0, 0.0),
                (Direction::Exit, Transition::Fade) => (0.0, rt.config.timing.stage_fade_time),
            };
            for speaker in &self.speakers {
                let deco = rt.deco(speaker)?.id;
                rt.host.presenter.fade_deco(deco, alpha, duration);
                if self.direction == Direction::Entry {
                    let auto = rt.is_autoplaced(rt.character(speaker)?);
                    if auto {
                        rt.autoplacer.add(speaker);
                    }
                }
            }
            self.wait = if self.speakers.is_empty() { 0.0 } else { duration };
            fire(&self.on_start);
            rt.update_highlights();
            self.phase = Phase::Loop;
        }

        if skip {
            self.phase = Phase::End;
        }

        if self.phase == Phase::Loop {
            self.wait -= dt;
            if self.wait <= 0.0 {
                self.phase = Phase::End;
            }
        }

        let mut finished = false;
        if self.phase == Phase::End {
            if self.direction == Direction::Exit {
                for speaker in &self.speakers {
                    rt.autoplacer.remove(speaker);
                }
            }
            fire(&self.on_end);
            finished = true;
        }

        let mut proceed = false;
        if let Some(c) = self.cont.as_mut() {
            *c -= dt;
            proceed = *c <= 0.0;
        }
        Ok((finished, proceed))
    }
}
