/// Progressive reveal of a line's text.
///
/// Before a word becomes partially visible, the text up to the end of that
/// word is measured; if it would wrap onto a new line, an explicit break
/// replaces the whitespace so already visible lines never reflow.
pub struct Unfold {
    chars: Vec<char>,
    speed: f32,
    progress: f32,
    revealed: usize,
    pub display_text: String,
}

impl Unfold {
    /// `None` when the factor or the available time leave nothing to animate.
    pub fn new(text: &str, read_time: f32, raw_read_time: f32, factor: f32) -> Option<Self> {
        let unfold_time = raw_read_time.min(read_time);
        if factor <= 0.0 || unfold_time <= 0.0 {
            return None;
        }
        let chars: Vec<char> = text.chars().collect();
        let speed = chars.len() as f32 / unfold_time / factor;
        Some(Self {
            chars,
            speed,
            progress: 0.0,
            revealed: 0,
            display_text: String::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Source characters consumed so far.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_done(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    /// Moves the cursor by `dt`. Returns true when `display_text` changed.
    /// `line_count` reports how many wrapped lines a text would take.
    pub fn update(&mut self, dt: f32, mut line_count: impl FnMut(&str) -> usize) -> bool {
        if self.is_done() {
            return false;
        }
        self.progress += dt * self.speed;
        let target = ((self.progress + 0.5) as usize).min(self.chars.len());
        if target <= self.revealed {
            return false;
        }

        let mut i = self.revealed;
        while i < target {
            let c = self.chars[i];
            if !c.is_whitespace() {
                self.display_text.push(c);
                i += 1;
                continue;
            }

            let ws_end = self.skip(i, true);
            let word_end = self.skip(ws_end, false);
            let mut probe = self.display_text.clone();
            probe.extend(&self.chars[i..word_end]);

            if line_count(&probe) > line_count(&self.display_text) {
                // 整段空白换成一个换行
                self.display_text.push('\n');
                i = ws_end;
            } else {
                let stop = ws_end.min(target);
                self.display_text.extend(&self.chars[i..stop]);
                i = stop;
            }
        }
        self.revealed = i;
        true
    }

    /// First index from `from` whose whitespace-ness differs from `ws`.
    fn skip(&self, from: usize, ws: bool) -> usize {
        let mut i = from;
        while i < self.chars.len() && self.chars[i].is_whitespace() == ws {
            i += 1;
        }
        i
    }
}
