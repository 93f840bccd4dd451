use std::fmt;
use std::rc::Rc;

use crate::error::{DialogError, Result};
use crate::script::Named;

/// Side-effect callback fired when an item starts or ends.
#[derive(Clone)]
pub struct Hook(Rc<dyn Fn()>);

impl Hook {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Hook(Rc::new(f))
    }

    pub fn call(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// Zero-argument test evaluated by the engine, e.g. "has the cutscene ended".
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn() -> bool>);

impl Predicate {
    pub fn new(f: impl Fn() -> bool + 'static) -> Self {
        Predicate(Rc::new(f))
    }

    pub fn test(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Activation condition of a line.
#[derive(Clone, Debug)]
pub enum Cond {
    Always(bool),
    When(Predicate),
}

impl Cond {
    pub fn holds(&self) -> bool {
        match self {
            Cond::Always(b) => *b,
            Cond::When(p) => p.test(),
        }
    }
}

impl Default for Cond {
    fn default() -> Self {
        Cond::Always(true)
    }
}

pub(crate) fn fire(hooks: &[Hook]) {
    for h in hooks {
        h.call();
    }
}

/// One utterance.
#[derive(Clone, Debug)]
pub struct Line {
    pub text: String,
    pub cond: Cond,
    pub on_start: Vec<Hook>,
    pub on_end: Vec<Hook>,
    pub branch: Option<String>,
    pub time: Option<f32>,
    pub time_factor: Option<f32>,
    pub ctime: Option<Named<f32>>,
    pub ctime_factor: Option<f32>,
    pub is_finished: Option<Predicate>,
    pub font: Option<String>,
    pub voice: Option<String>,
    pub volume: Option<f32>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cond: Cond::default(),
            on_start: Vec::new(),
            on_end: Vec::new(),
            branch: None,
            time: None,
            time_factor: None,
            ctime: None,
            ctime_factor: None,
            is_finished: None,
            font: None,
            voice: None,
            volume: None,
        }
    }

    pub fn active(mut self, on: bool) -> Self {
        self.cond = Cond::Always(on);
        self
    }

    pub fn when(mut self, f: impl Fn() -> bool + 'static) -> Self {
        self.cond = Cond::When(Predicate::new(f));
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

    pub fn branch(mut self, name: impl Into<String>) -> Self {
        self.branch = Some(name.into());
        self
    }

    pub fn time(mut self, secs: f32) -> Self {
        self.time = Some(secs);
        self
    }

    pub fn time_factor(mut self, f: f32) -> Self {
        self.time_factor = Some(f);
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

    pub fn ctime_factor(mut self, f: f32) -> Self {
        self.ctime_factor = Some(f);
        self
    }

    pub fn finished_when(mut self, f: impl Fn() -> bool + 'static) -> Self {
        self.is_finished = Some(Predicate::new(f));
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn voice(mut self, path: impl Into<String>, volume: f32) -> Self {
        self.voice = Some(path.into());
        self.volume = Some(volume);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.time.is_some() && self.time_factor.is_some() {
            return Err(DialogError::ConflictingTiming("time", "time_factor"));
        }
        if self.ctime.is_some() && self.ctime_factor.is_some() {
            return Err(DialogError::ConflictingTiming("ctime", "ctime_factor"));
        }
        Ok(())
    }
}

/// A bare delay.
#[derive(Clone, Debug, Default)]
pub struct Pause {
    pub time: f32,
    pub on_start: Vec<Hook>,
    pub on_end: Vec<Hook>,
    pub branch: Option<String>,
    pub is_finished: Option<Predicate>,
}

impl Pause {
    pub fn new(secs: f32) -> Self {
        Self { time: secs, ..Self::default() }
    }

    pub fn on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start.push(Hook::new(f));
        self
    }

    pub fn on_end(mut self, f: impl Fn() + 'static) -> Self {
        self.on_end.push(Hook::new(f));
        self
    }

    pub fn branch(mut self, name: impl Into<String>) -> Self {
        self.branch = Some(name.into());
        self
    }

    pub fn finished_when(mut self, f: impl Fn() -> bool + 'static) -> Self {
        self.is_finished = Some(Predicate::new(f));
        self
    }
}
