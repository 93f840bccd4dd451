use std::rc::Rc;
use lumina_ui::{Align, Anchor, Rect, Vec2};

use crate::error::Result;
use crate::executor::runtime::{ContextId, Runtime};
use crate::host::{ElementId, SoundId, TextStyle};
use crate::script::{fire, Character, CharacterId, Line, ModRef, WorldAnchor};
use crate::timing::{continuation_time, reading_time, Continuation};
use crate::unfold::Unfold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStage {
    Wait,
    Start,
    Loop,
    End1,
    End2,
    Done,
}

/// Screen-space constants for a bubble following a world anchor.
struct Tracking {
    anchor: WorldAnchor,
    world_offset: [f32; 3],
    offset: Vec2,
    /// Where the deco origin may go without its box leaving the screen.
    text_area: Rect,
    /// Where the off-screen arrow may go.
    arrow_area: Rect,
    center: Vec2,
    half_width: f32,
    viewport: Rect,
    placed: Option<Vec2>,
    arrow_shown: bool,
}

pub(crate) struct LineState {
    line: Rc<Line>,
    speaker: CharacterId,
    swipe: Option<f32>,
    style: TextStyle,
    element: Option<ElementId>,
    stage: LineStage,
    started: bool,
    skipped: bool,
    read: f32,
    cont: Option<f32>,
    tail: f32,
    voice: Option<SoundId>,
    line_sound: Option<SoundId>,
    unfold: Option<Unfold>,
    unfold_sound: Option<SoundId>,
    tracking: Option<Tracking>,
    skippable: bool,
}

impl LineState {
    pub fn open(rt: &mut Runtime, speaker: &str, line: Rc<Line>, charmod: Option<&ModRef>) -> Result<Self> {
        let ch = rt.resolve(speaker, charmod)?;
        let autoplaced = rt.is_autoplaced(&ch);
        let cfg = &rt.config;

        let size = ch.size.resolve(&cfg.named_sizes, "size")?;
        let width = if autoplaced {
            cfg.autoplace_width
        } else {
            ch.width.resolve(&cfg.named_widths, "width")?
        };
        let offset = ch.pos.resolve(&cfg.named_positions, "position")?;
        let font = line.font.clone()
            .or_else(|| ch.font.clone())
            .unwrap_or_else(|| cfg.font.clone());
        let (anchor, align) = if autoplaced {
            (Anchor::TOP_LEFT, Align::Left)
        } else {
            (ch.anchor, ch.align)
        };
        let style = TextStyle {
            font,
            size,
            width,
            color: ch.color,
            shadow_color: ch.shadow_color,
            outline_color: ch.outline_color,
            outline_width: ch.outline_width,
            align,
            anchor,
        };

        let deco = rt.deco(speaker)?.id;
        if !autoplaced && ch.world_anchor.is_none() {
            rt.host.presenter.place_deco(deco, offset);
        }
        let element = rt.host.presenter.create_text(deco, &line.text, &style);
        rt.invalidate_bounds(speaker);
        let bounds = rt.bounds(speaker)?;

        let tracking = match &ch.world_anchor {
            Some(anchor) if !autoplaced => {
                Some(Tracking::new(rt, anchor.clone(), &ch, offset, bounds))
            }
            _ => None,
        };

        let voice = line.voice.as_ref().map(|v| {
            let path = if v.contains('/') { v.clone() } else { format!("audio/voices/{}", v) };
            rt.host.audio.load(&path, line.volume.unwrap_or(1.0), false)
        });

        let wpm = ch.wpm_speed.unwrap_or(rt.config.wpm_speed);
        let mut read = match (voice, line.time) {
            (Some(v), t) => rt.host.audio.duration(v).max(t.unwrap_or(0.0)),
            (None, Some(t)) => t,
            (None, None) => reading_time(&line.text, wpm, false).max(rt.config.timing.min_read_time),
        };
        if let Some(f) = line.time_factor {
            read *= f;
        }

        let cont = match (line.ctime_factor, &line.ctime) {
            (Some(f), _) => Some(continuation_time(read, Continuation::Factor(f))),
            (None, Some(ct)) => {
                let ct = ct.resolve(&rt.config.named_ctimes, "continuation time")?;
                Some(continuation_time(read, Continuation::Time(ct)))
            }
            (None, None) => None,
        };

        let line_sound = ch.line_sound.as_ref().map(|s| {
            rt.host.audio.load(&format!("audio/sounds/{}", s), ch.line_volume, ch.line_sound_loop)
        });

        let mut unfold = None;
        let mut unfold_sound = None;
        if ch.world_anchor.is_none() {
            let factor = ch.unfold_factor.unwrap_or(rt.config.unfold_factor);
            unfold = Unfold::new(&line.text, read, reading_time(&line.text, wpm, true), factor);
            if unfold.is_some() {
                unfold_sound = ch.unfold_sound.as_ref().map(|s| {
                    rt.host.audio.load(&format!("audio/sounds/{}", s), ch.unfold_volume, true)
                });
            }
        }

        let skippable = line.time.is_none() && line.ctime.is_none();
        log::debug!("Opened line of '{}': {:?} (read {:.2}s)", speaker, line.text, read);

        Ok(Self {
            speaker: speaker.to_string(),
            swipe: ch.swipe,
            style,
            element: Some(element),
            stage: LineStage::Wait,
            started: false,
            skipped: false,
            read,
            cont,
            tail: 0.0,
            voice,
            line_sound,
            unfold,
            unfold_sound,
            tracking,
            skippable,
            line,
        })
    }

    pub fn skippable(&self) -> bool {
        self.skippable
    }

    pub fn jump_target(&self) -> Option<&str> {
        self.line.branch.as_deref()
    }

    /// Returns `(finished, proceed)`.
    pub fn update(&mut self, rt: &mut Runtime, ctx: ContextId, dt: f32, skip: bool) -> Result<(bool, bool)> {
        if skip && matches!(self.stage, LineStage::Wait | LineStage::Start | LineStage::Loop) {
            self.stage = LineStage::End1;
            self.skipped = true;
            if let Some(c) = self.cont.as_mut() {
                *c = 0.0;
            }
        }

        if self.stage == LineStage::Wait && rt.deco(&self.speaker)?.talking.is_empty() {
            self.stage = LineStage::Start;
        }

        if self.stage == LineStage::Start {
            self.begin(rt, ctx)?;
            self.stage = LineStage::Loop;
        }

        if self.stage == LineStage::Loop {
            if self.tracking.is_some() {
                self.track(rt)?;
            }
            self.step_unfold(rt, dt);

            let ended = self.line.is_finished.as_ref().is_some_and(|p| p.test());
            self.read -= dt;
            if ended || self.read <= 0.0 {
                self.stage = LineStage::End1;
            }
        }

        let mut entered_tail = false;
        if self.stage == LineStage::End1 {
            self.read = 0.0;
            match (self.swipe, self.element) {
                (Some(angle), Some(el)) if !self.skipped => {
                    let duration = rt.config.timing.swipe_duration;
                    rt.host.presenter.swipe(el, angle, duration, true);
                    self.tail = duration;
                }
                _ => {
                    self.remove_element(rt);
                    self.tail = 0.0;
                }
            }
            entered_tail = true;
            self.stage = LineStage::End2;
        }

        if self.stage == LineStage::End2 {
            if self.tail > 0.0 && !entered_tail {
                self.tail -= dt;
            }
            if self.tail <= 0.0 {
                self.finish(rt, ctx)?;
                self.stage = LineStage::Done;
            }
        }

        let mut proceed = false;
        if let Some(c) = self.cont.as_mut() {
            if self.started {
                *c -= dt;
            }
            proceed = *c <= 0.0;
        }
        let finished = self.stage == LineStage::Done && (self.cont.is_none() || proceed);
        Ok((finished, proceed))
    }

    fn begin(&mut self, rt: &mut Runtime, ctx: ContextId) -> Result<()> {
        if let Some(el) = self.element {
            if self.unfold.is_some() {
                rt.host.presenter.set_text(el, "");
            }
            rt.host.presenter.show(el);
            if let Some(angle) = self.swipe {
                rt.host.presenter.swipe(el, angle, rt.config.timing.swipe_duration, false);
            }
        }
        fire(&self.line.on_start);
        for sound in [self.voice, self.line_sound, self.unfold_sound].into_iter().flatten() {
            rt.host.audio.play(sound);
        }
        rt.start_talking(&self.speaker, ctx)?;
        self.started = true;
        Ok(())
    }

    fn finish(&mut self, rt: &mut Runtime, ctx: ContextId) -> Result<()> {
        self.remove_element(rt);
        fire(&self.line.on_end);
        rt.stop_talking(&self.speaker, ctx);
        self.hide_arrow(rt)?;
        for sound in [self.line_sound.take(), self.unfold_sound.take()].into_iter().flatten() {
            rt.host.audio.stop(sound);
        }
        if self.skipped {
            if let Some(v) = self.voice {
                rt.host.audio.fade(v, 0.0, rt.config.timing.silent_fade_time);
            }
        }
        Ok(())
    }

    fn step_unfold(&mut self, rt: &mut Runtime, dt: f32) {
        let Some(unfold) = self.unfold.as_mut() else { return };
        if !unfold.is_done() {
            let presenter = &mut rt.host.presenter;
            let style = &self.style;
            let changed = unfold.update(dt, |t| presenter.wrapped_line_count(t, style));
            if changed {
                if let Some(el) = self.element {
                    rt.host.presenter.set_text(el, &unfold.display_text);
                }
            }
        } else if let Some(sound) = self.unfold_sound.take() {
            rt.host.audio.stop(sound);
        }
    }

    fn remove_element(&mut self, rt: &mut Runtime) {
        if let Some(el) = self.element.take() {
            rt.host.presenter.remove(el);
            rt.invalidate_bounds(&self.speaker);
        }
    }

    fn hide_arrow(&mut self, rt: &mut Runtime) -> Result<()> {
        if let Some(tr) = self.tracking.as_mut() {
            if tr.arrow_shown {
                tr.arrow_shown = false;
                let deco = rt.deco(&self.speaker)?.id;
                rt.host.presenter.hide_arrow(deco);
            }
        }
        Ok(())
    }

    /// Moves the bubble to its anchor's projected position, clamped to the
    /// screen; an arrow points towards anchors that are off screen.
    fn track(&mut self, rt: &mut Runtime) -> Result<()> {
        let Some(tr) = self.tracking.as_mut() else { return Ok(()) };
        let projection = rt.host.projector.project(&tr.anchor, tr.world_offset);
        let deco = rt.deco(&self.speaker)?;
        let deco_id = deco.id;
        let base = match projection {
            Some(p) => {
                let pos = if p.behind { p.pos.unit() * (2.0 * tr.half_width) } else { p.pos };
                deco.last_screen_pos = pos;
                pos
            }
            None => deco.last_screen_pos,
        };

        let mut pos = base + tr.offset;
        let mut arrow = None;
        if !tr.text_area.contains(pos) {
            if let Some(c) = tr.text_area.clip_segment(Vec2::ZERO, pos) {
                pos = c;
            }
            let vp = tr.viewport;
            let visible = vp.x < base.x && base.x < vp.right() && vp.y < base.y && base.y < vp.top();
            if !visible {
                let from = pos + tr.center;
                let to = pos.unit() * (2.0 * tr.half_width);
                arrow = tr.arrow_area.clip_segment(from, to);
            }
        }

        match arrow {
            Some(at) => {
                let angle = -at.y.atan2(at.x).to_degrees();
                rt.host.presenter.show_arrow(deco_id, at, angle);
                tr.arrow_shown = true;
            }
            None if tr.arrow_shown => {
                rt.host.presenter.hide_arrow(deco_id);
                tr.arrow_shown = false;
            }
            None => {}
        }
        if tr.placed != Some(pos) {
            rt.host.presenter.place_deco(deco_id, pos);
            tr.placed = Some(pos);
        }
        Ok(())
    }

    /// Gives back everything the line holds when the run stops early.
    pub fn release(&mut self, rt: &mut Runtime, ctx: ContextId) {
        self.remove_element(rt);
        for sound in [self.voice.take(), self.line_sound.take(), self.unfold_sound.take()]
            .into_iter()
            .flatten()
        {
            rt.host.audio.stop(sound);
        }
        if let Some(deco) = rt.decos.get_mut(&self.speaker) {
            deco.talking.retain(|c| *c != ctx);
        }
    }
}

impl Tracking {
    fn new(rt: &Runtime, anchor: WorldAnchor, ch: &Character, offset: Vec2, b: Rect) -> Self {
        let vp = rt.host.presenter.viewport();
        let a = rt.config.timing.arrow_size;
        let text_area = Rect::from_min_max(
            Vec2::new(vp.x - b.x + a, vp.y - b.y + a),
            Vec2::new(vp.right() - b.right() - a, vp.top() - b.top() - a),
        );
        let arrow_area = vp.expand(-0.5 * a, -0.5 * a, -0.5 * a, -0.5 * a);
        Self {
            anchor,
            world_offset: ch.world_offset.unwrap_or([0.0; 3]),
            offset,
            text_area,
            arrow_area,
            center: b.center(),
            half_width: vp.w * 0.5,
            viewport: vp,
            placed: None,
            arrow_shown: false,
        }
    }
}
