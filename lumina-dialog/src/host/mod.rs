//! Seams to the embedding program: visuals, audio, world projection, input
//! and time. A run only ever talks to its [`Host`].

mod headless;

use std::time::Instant;
use lumina_ui::{Align, Anchor, Color, Rect, Vec2};

use crate::script::WorldAnchor;

pub use headless::HeadlessHost;

pub type DecoId = u64;
pub type ElementId = u64;
pub type MenuId = u64;
pub type SoundId = u64;

/// Everything needed to build the visual shell of one speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoSpec {
    pub speaker: String,
    pub name: Option<String>,
    pub portrait: Option<String>,
    pub portrait_size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub width: f32,
    pub color: Color,
    pub shadow_color: Option<Color>,
    pub outline_color: Color,
    pub outline_width: f32,
    pub align: Align,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub font: String,
    pub size: f32,
    pub color: Color,
}

/// Screen position of a world anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub pos: Vec2,
    pub behind: bool,
}

pub trait Presenter {
    /// False once the root visual target is gone; the run then stops.
    fn is_alive(&self) -> bool;
    fn viewport(&self) -> Rect;

    fn create_deco(&mut self, spec: &DecoSpec) -> DecoId;
    fn rebuild_deco(&mut self, deco: DecoId, spec: &DecoSpec);
    fn release_deco(&mut self, deco: DecoId);
    /// Bounds of the deco and its children, relative to its own position.
    fn deco_bounds(&mut self, deco: DecoId) -> Rect;
    fn fade_deco(&mut self, deco: DecoId, alpha: f32, duration: f32);
    fn highlight_deco(&mut self, deco: DecoId, alpha: f32, duration: f32);
    fn place_deco(&mut self, deco: DecoId, pos: Vec2);
    fn slide_deco(&mut self, deco: DecoId, pos: Vec2, duration: f32);

    /// Creates a hidden text element inside `deco`.
    fn create_text(&mut self, deco: DecoId, text: &str, style: &TextStyle) -> ElementId;
    fn set_text(&mut self, element: ElementId, text: &str);
    fn wrapped_line_count(&mut self, text: &str, style: &TextStyle) -> usize;
    fn show(&mut self, element: ElementId);
    fn swipe(&mut self, element: ElementId, angle_deg: f32, duration: f32, cover: bool);
    fn remove(&mut self, element: ElementId);

    fn show_arrow(&mut self, deco: DecoId, pos: Vec2, angle_deg: f32);
    fn hide_arrow(&mut self, deco: DecoId);

    fn show_menu(&mut self, entries: &[MenuEntry]) -> MenuId;
    fn remove_menu(&mut self, menu: MenuId);
}

pub trait AudioSink {
    fn load(&mut self, path: &str, volume: f32, looping: bool) -> SoundId;
    fn play(&mut self, sound: SoundId);
    fn stop(&mut self, sound: SoundId);
    fn fade(&mut self, sound: SoundId, volume: f32, duration: f32);
    /// Length in seconds.
    fn duration(&self, sound: SoundId) -> f32;
}

pub trait Projector {
    /// `None` when the anchored object no longer exists.
    fn project(&self, anchor: &WorldAnchor, offset: [f32; 3]) -> Option<Projection>;
}

pub trait InputHub {
    fn bind(&mut self, group: &str, trigger: &str, priority: i32);
    fn unbind_group(&mut self, group: &str);
    /// Triggers of `group` pressed since the last poll that won their priority challenge.
    fn take_pressed(&mut self, group: &str) -> Vec<String>;
}

pub struct Host {
    pub presenter: Box<dyn Presenter>,
    pub audio: Box<dyn AudioSink>,
    pub projector: Box<dyn Projector>,
    pub input: Box<dyn InputHub>,
}

impl Host {
    pub fn new(
        presenter: impl Presenter + 'static,
        audio: impl AudioSink + 'static,
        projector: impl Projector + 'static,
        input: impl InputHub + 'static,
    ) -> Self {
        Self {
            presenter: Box::new(presenter),
            audio: Box::new(audio),
            projector: Box::new(projector),
            input: Box::new(input),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        HeadlessHost::new().host()
    }
}

/// Source of per-frame time steps.
pub trait Clock {
    fn dt(&mut self) -> f32;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn dt(&mut self) -> f32 {
        self.0
    }
}

/// Real elapsed time between calls; the first call yields zero.
#[derive(Debug, Default)]
pub struct WallClock {
    last: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for WallClock {
    fn dt(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self.last.map(|t| now.duration_since(t).as_secs_f32()).unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}
