use crate::script::{fire, Pause};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseStage {
    Start,
    Loop,
    End,
}

pub(crate) struct PauseState {
    pause: Pause,
    stage: PauseStage,
    wait: f32,
}

impl PauseState {
    pub fn new(pause: Pause) -> Self {
        let wait = pause.time;
        Self { pause, stage: PauseStage::Start, wait }
    }

    pub fn jump_target(&self) -> Option<&str> {
        self.pause.branch.as_deref()
    }

    /// Returns `(finished, proceed)`; a pause never lets the next item in early.
    pub fn update(&mut self, dt: f32, skip: bool) -> (bool, bool) {
        if skip {
            self.stage = PauseStage::End;
        }

        if self.stage == PauseStage::Start {
            fire(&self.pause.on_start);
            self.stage = PauseStage::Loop;
        }

        if self.stage == PauseStage::Loop {
            let done = self.pause.is_finished.as_ref().is_some_and(|p| p.test());
            self.wait -= dt;
            if done || self.wait <= 0.0 {
                self.stage = PauseStage::End;
            }
        }

        if self.stage == PauseStage::End {
            fire(&self.pause.on_end);
            return (true, false);
        }
        (false, false)
    }
}
