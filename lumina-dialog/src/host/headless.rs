use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use lumina_ui::{Rect, VAlign, Vec2};

use crate::event::DialogEvent;
use crate::host::{
    AudioSink, DecoId, DecoSpec, ElementId, Host, InputHub, MenuEntry, MenuId, Presenter,
    Projection, Projector, SoundId, TextStyle,
};
use crate::script::WorldAnchor;

const ASPECT: f32 = 16.0 / 9.0;
const GLYPH_WIDTH: f32 = 0.0025;
const LINE_HEIGHT: f32 = 0.005;
const NAME_TAG_HEIGHT: f32 = 0.05;
const DEFAULT_SOUND_LENGTH: f32 = 2.0;

struct Deco {
    speaker: String,
    portrait: Option<f32>,
}

struct Element {
    deco: DecoId,
    text: String,
    style: TextStyle,
}

struct Sound {
    path: String,
    length: f32,
}

#[derive(Default)]
struct State {
    alive: bool,
    next_id: u64,
    events: Vec<DialogEvent>,
    decos: FxHashMap<DecoId, Deco>,
    elements: FxHashMap<ElementId, Element>,
    sounds: FxHashMap<SoundId, Sound>,
    sound_lengths: FxHashMap<String, f32>,
    anchors: FxHashMap<String, Projection>,
    bindings: Vec<(String, String, i32)>,
    pressed: Vec<String>,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn speaker(&self, deco: DecoId) -> String {
        self.decos.get(&deco).map(|d| d.speaker.clone()).unwrap_or_default()
    }

    fn element_speaker(&self, element: ElementId) -> String {
        self.elements.get(&element).map(|e| self.speaker(e.deco)).unwrap_or_default()
    }
}

/// Deterministic host without any output device. Every call is recorded as a
/// [`DialogEvent`]; text metrics use a fixed-pitch font model.
#[derive(Clone)]
pub struct HeadlessHost {
    state: Rc<RefCell<State>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        let state = State { alive: true, ..State::default() };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Adapters sharing this recorder.
    pub fn host(&self) -> Host {
        Host {
            presenter: Box::new(HeadlessPresenter(self.state.clone())),
            audio: Box::new(HeadlessAudio(self.state.clone())),
            projector: Box::new(HeadlessProjector(self.state.clone())),
            input: Box::new(HeadlessInput(self.state.clone())),
        }
    }

    pub fn events(&self) -> Vec<DialogEvent> {
        self.state.borrow().events.clone()
    }

    pub fn take_events(&self) -> Vec<DialogEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Presses `trigger`; dropped unless some group has it bound.
    pub fn press(&self, trigger: &str) {
        let mut st = self.state.borrow_mut();
        if st.bindings.iter().any(|(_, t, _)| t == trigger) {
            st.pressed.push(trigger.to_string());
        }
    }

    pub fn set_anchor(&self, anchor: &str, projection: Option<Projection>) {
        let mut st = self.state.borrow_mut();
        match projection {
            Some(p) => st.anchors.insert(anchor.to_string(), p),
            None => st.anchors.remove(anchor),
        };
    }

    pub fn set_sound_length(&self, path: &str, secs: f32) {
        self.state.borrow_mut().sound_lengths.insert(path.to_string(), secs);
    }

    pub fn kill_root(&self) {
        self.state.borrow_mut().alive = false;
    }

    pub fn live_decos(&self) -> usize {
        self.state.borrow().decos.len()
    }

    pub fn live_elements(&self) -> usize {
        self.state.borrow().elements.len()
    }

    pub fn bindings(&self) -> Vec<(String, String, i32)> {
        self.state.borrow().bindings.clone()
    }
}

/// Greedy word wrap with every glyph `size * GLYPH_WIDTH` wide.
pub(crate) fn wrap_count(text: &str, style: &TextStyle) -> usize {
    let per_line = ((style.width / (style.size * GLYPH_WIDTH) + 1e-3).floor() as usize).max(1);
    text.split('\n')
        .map(|para| {
            let mut lines = 1;
            let mut used = 0usize;
            for word in para.split_whitespace() {
                let len = word.chars().count();
                let need = if used == 0 { len } else { used + 1 + len };
                if used > 0 && need > per_line {
                    lines += 1;
                    used = len;
                } else {
                    used = need;
                }
            }
            lines
        })
        .sum()
}

fn text_rect(text: &str, style: &TextStyle) -> Rect {
    let h = wrap_count(text, style) as f32 * style.size * LINE_HEIGHT;
    let w = style.width;
    let x = -w * style.anchor.h.index() as f32 * 0.5;
    let y = match style.anchor.v {
        VAlign::Top => -h,
        VAlign::Middle => -h * 0.5,
        VAlign::Bottom => 0.0,
    };
    Rect::new(x, y, w, h)
}

fn union(a: Rect, b: Rect) -> Rect {
    let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
    let max = Vec2::new(a.right().max(b.right()), a.top().max(b.top()));
    Rect::from_min_max(min, max)
}

struct HeadlessPresenter(Rc<RefCell<State>>);

impl Presenter for HeadlessPresenter {
    fn is_alive(&self) -> bool {
        self.0.borrow().alive
    }

    fn viewport(&self) -> Rect {
        Rect::new(-ASPECT, -1.0, 2.0 * ASPECT, 2.0)
    }

    fn create_deco(&mut self, spec: &DecoSpec) -> DecoId {
        let mut st = self.0.borrow_mut();
        let id = st.id();
        st.decos.insert(id, Deco {
            speaker: spec.speaker.clone(),
            portrait: spec.portrait.as_ref().map(|_| spec.portrait_size),
        });
        st.events.push(DialogEvent::DecoCreated { speaker: spec.speaker.clone() });
        id
    }

    fn rebuild_deco(&mut self, deco: DecoId, spec: &DecoSpec) {
        let mut st = self.0.borrow_mut();
        if let Some(d) = st.decos.get_mut(&deco) {
            d.portrait = spec.portrait.as_ref().map(|_| spec.portrait_size);
        }
        st.events.push(DialogEvent::DecoRebuilt { speaker: spec.speaker.clone() });
    }

    fn release_deco(&mut self, deco: DecoId) {
        let mut st = self.0.borrow_mut();
        if let Some(d) = st.decos.remove(&deco) {
            st.elements.retain(|_, e| e.deco != deco);
            st.events.push(DialogEvent::DecoReleased { speaker: d.speaker });
        }
    }

    fn deco_bounds(&mut self, deco: DecoId) -> Rect {
        let st = self.0.borrow();
        let mut bounds = match st.decos.get(&deco).and_then(|d| d.portrait) {
            Some(size) => Rect::new(0.0, -size, size, size),
            None => Rect::new(0.0, -NAME_TAG_HEIGHT, 0.0, NAME_TAG_HEIGHT),
        };
        for e in st.elements.values().filter(|e| e.deco == deco) {
            bounds = union(bounds, text_rect(&e.text, &e.style));
        }
        bounds
    }

    fn fade_deco(&mut self, deco: DecoId, alpha: f32, duration: f32) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::DecoFaded { speaker, alpha, duration });
    }

    fn highlight_deco(&mut self, deco: DecoId, alpha: f32, duration: f32) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::Highlighted { speaker, alpha, duration });
    }

    fn place_deco(&mut self, deco: DecoId, pos: Vec2) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::Placed { speaker, pos });
    }

    fn slide_deco(&mut self, deco: DecoId, pos: Vec2, duration: f32) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::Slid { speaker, pos, duration });
    }

    fn create_text(&mut self, deco: DecoId, text: &str, style: &TextStyle) -> ElementId {
        let mut st = self.0.borrow_mut();
        let id = st.id();
        st.elements.insert(id, Element { deco, text: text.to_string(), style: style.clone() });
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::TextCreated { speaker, text: text.to_string() });
        id
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        let mut st = self.0.borrow_mut();
        if let Some(e) = st.elements.get_mut(&element) {
            e.text = text.to_string();
        }
        let speaker = st.element_speaker(element);
        st.events.push(DialogEvent::TextChanged { speaker, text: text.to_string() });
    }

    fn wrapped_line_count(&mut self, text: &str, style: &TextStyle) -> usize {
        wrap_count(text, style)
    }

    fn show(&mut self, element: ElementId) {
        let mut st = self.0.borrow_mut();
        let text = st.elements.get(&element).map(|e| e.text.clone()).unwrap_or_default();
        let speaker = st.element_speaker(element);
        st.events.push(DialogEvent::TextShown { speaker, text });
    }

    fn swipe(&mut self, element: ElementId, _angle_deg: f32, duration: f32, cover: bool) {
        let mut st = self.0.borrow_mut();
        let speaker = st.element_speaker(element);
        st.events.push(DialogEvent::TextSwiped { speaker, cover, duration });
    }

    fn remove(&mut self, element: ElementId) {
        let mut st = self.0.borrow_mut();
        let speaker = st.element_speaker(element);
        if st.elements.remove(&element).is_some() {
            st.events.push(DialogEvent::TextRemoved { speaker });
        }
    }

    fn show_arrow(&mut self, deco: DecoId, pos: Vec2, angle_deg: f32) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::ArrowShown { speaker, pos, angle: angle_deg });
    }

    fn hide_arrow(&mut self, deco: DecoId) {
        let mut st = self.0.borrow_mut();
        let speaker = st.speaker(deco);
        st.events.push(DialogEvent::ArrowHidden { speaker });
    }

    fn show_menu(&mut self, entries: &[MenuEntry]) -> MenuId {
        let mut st = self.0.borrow_mut();
        let options = entries.iter().map(|e| e.label.clone()).collect();
        st.events.push(DialogEvent::MenuShown { options });
        st.id()
    }

    fn remove_menu(&mut self, _menu: MenuId) {
        self.0.borrow_mut().events.push(DialogEvent::MenuRemoved);
    }
}

struct HeadlessAudio(Rc<RefCell<State>>);

impl AudioSink for HeadlessAudio {
    fn load(&mut self, path: &str, _volume: f32, _looping: bool) -> SoundId {
        let mut st = self.0.borrow_mut();
        let length = st.sound_lengths.get(path).copied().unwrap_or(DEFAULT_SOUND_LENGTH);
        let id = st.id();
        st.sounds.insert(id, Sound { path: path.to_string(), length });
        id
    }

    fn play(&mut self, sound: SoundId) {
        let mut st = self.0.borrow_mut();
        if let Some(path) = st.sounds.get(&sound).map(|s| s.path.clone()) {
            st.events.push(DialogEvent::SoundPlayed { path });
        }
    }

    fn stop(&mut self, sound: SoundId) {
        let mut st = self.0.borrow_mut();
        if let Some(s) = st.sounds.remove(&sound) {
            st.events.push(DialogEvent::SoundStopped { path: s.path });
        }
    }

    fn fade(&mut self, sound: SoundId, volume: f32, duration: f32) {
        let mut st = self.0.borrow_mut();
        if let Some(path) = st.sounds.get(&sound).map(|s| s.path.clone()) {
            st.events.push(DialogEvent::SoundFaded { path, volume, duration });
        }
    }

    fn duration(&self, sound: SoundId) -> f32 {
        self.0.borrow().sounds.get(&sound).map(|s| s.length).unwrap_or(0.0)
    }
}

struct HeadlessProjector(Rc<RefCell<State>>);

impl Projector for HeadlessProjector {
    fn project(&self, anchor: &WorldAnchor, offset: [f32; 3]) -> Option<Projection> {
        self.0.borrow().anchors.get(&anchor.0).map(|p| Projection {
            pos: p.pos + Vec2::new(offset[0], offset[1]),
            behind: p.behind,
        })
    }
}

struct HeadlessInput(Rc<RefCell<State>>);

impl InputHub for HeadlessInput {
    fn bind(&mut self, group: &str, trigger: &str, priority: i32) {
        let mut st = self.0.borrow_mut();
        st.bindings.push((group.to_string(), trigger.to_string(), priority));
        st.events.push(DialogEvent::Bound {
            group: group.to_string(),
            trigger: trigger.to_string(),
            priority,
        });
    }

    fn unbind_group(&mut self, group: &str) {
        let mut st = self.0.borrow_mut();
        let before = st.bindings.len();
        st.bindings.retain(|(g, _, _)| g != group);
        if st.bindings.len() != before {
            st.events.push(DialogEvent::Unbound { group: group.to_string() });
        }
    }

    fn take_pressed(&mut self, group: &str) -> Vec<String> {
        let mut st = self.0.borrow_mut();
        let st = &mut *st;
        let mut taken = Vec::new();
        let bindings = &st.bindings;
        st.pressed.retain(|trigger| {
            let winner = bindings
                .iter()
                .filter(|(_, t, _)| t == trigger)
                .max_by_key(|(_, _, prio)| *prio);
            match winner {
                Some((g, _, _)) if g == group => {
                    taken.push(trigger.clone());
                    false
                }
                Some(_) => true,
                None => false,
            }
        });
        taken
    }
}
