use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("static pattern"));

/// Reading words: word characters divided by five.
pub fn normalized_words(text: &str) -> f32 {
    NON_WORD.replace_all(text, "").chars().count() as f32 / 5.0
}

/// Seconds needed to read `text` at `wpm`. Unless `raw`, one extra second
/// covers the eye moving in and out.
pub fn reading_time(text: &str, wpm: f32, raw: bool) -> f32 {
    let mut secs = normalized_words(text) / (wpm / 60.0);
    if !raw {
        secs += 1.0;
    }
    secs
}

/// How a line lets the next item start before it is itself done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Continuation {
    /// Positive: that fraction of the read time. Zero or negative: the read
    /// time shortened by that fraction.
    Factor(f32),
    /// Non-negative: seconds after start. Negative: seconds before the read time ends.
    Time(f32),
}

/// Seconds after start at which the next item may open.
pub fn continuation_time(read_time: f32, policy: Continuation) -> f32 {
    match policy {
        Continuation::Factor(f) if f > 0.0 => read_time * f,
        Continuation::Factor(f) => read_time * (1.0 + f),
        Continuation::Time(t) if t >= 0.0 => t,
        Continuation::Time(t) => read_time + t,
    }
}
