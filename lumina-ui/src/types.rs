use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
    pub const GRAY: Self = Self { r: 128, g: 128, b: 128, a: 255 };

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(mut self, a: u8) -> Self {
        self.a = a;
        self
    }
}

/// Screen-space point or offset. Screen coordinates are centered on the
/// viewport with `y` growing upwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f32, f32)", into = "(f32, f32)")]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn unit(self) -> Self {
        let len = self.length();
        if len != 0.0 { self * (1.0 / len) } else { self }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for (f32, f32) {
    fn from(v: Vec2) -> Self {
        (v.x, v.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned box; `(x, y)` is the minimum (bottom-left) corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.w &&
            p.y >= self.y && p.y < self.y + self.h
    }

    /// Grows (or with negative amounts shrinks) each side independently.
    pub fn expand(&self, left: f32, right: f32, bottom: f32, top: f32) -> Rect {
        Rect::new(self.x - left, self.y - bottom, self.w + left + right, self.h + bottom + top)
    }

    pub fn translate(&self, by: Vec2) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }

    /// Whether the vertical extents of the two boxes intersect.
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.y < other.top() && other.y < self.top()
    }

    /// Edges in counter-clockwise order, starting at the bottom edge.
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let c1 = self.min();
        let c2 = Vec2::new(self.right(), self.y);
        let c3 = self.max();
        let c4 = Vec2::new(self.x, self.top());
        [(c1, c2), (c2, c3), (c3, c4), (c4, c1)]
    }

    /// First point where the segment `from -> to` crosses the border.
    pub fn clip_segment(&self, from: Vec2, to: Vec2) -> Option<Vec2> {
        self.edges()
            .iter()
            .find_map(|&(b1, b2)| segment_intersect(from, to, b1, b2))
    }
}

/// Intersection of segments `a1-a2` and `b1-b2`, if they cross.
pub fn segment_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let d = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if d == 0.0 {
        return None;
    }
    let ta = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / d;
    let tb = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / d;
    if (0.0..=1.0).contains(&ta) && (0.0..=1.0).contains(&tb) {
        Some(a1 + (a2 - a1) * ta)
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParseLayoutError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} type '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseLayoutError {}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'l' => Some(Align::Left),
            'c' => Some(Align::Center),
            'r' => Some(Align::Right),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Align::Left => 'l',
            Align::Center => 'c',
            Align::Right => 'r',
        }
    }

    /// 0 for left, 1 for center, 2 for right.
    pub fn index(self) -> i32 {
        match self {
            Align::Left => 0,
            Align::Center => 1,
            Align::Right => 2,
        }
    }
}

impl FromStr for Align {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next().and_then(Align::from_char), chars.next()) {
            (Some(a), None) => Ok(a),
            _ => Err(ParseLayoutError { kind: "alignment", value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for Align {
    type Error = ParseLayoutError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Align> for String {
    fn from(a: Align) -> String {
        a.as_char().to_string()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl VAlign {
    fn from_char(c: char) -> Option<Self> {
        match c {
            't' => Some(VAlign::Top),
            'm' => Some(VAlign::Middle),
            'b' => Some(VAlign::Bottom),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            VAlign::Top => 't',
            VAlign::Middle => 'm',
            VAlign::Bottom => 'b',
        }
    }
}

/// Which point of a text block sits at its position, e.g. `tl` or `mc`.
/// The horizontal letter may also come first (`lt` reads as `tl`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor {
    pub v: VAlign,
    pub h: Align,
}

impl Anchor {
    pub const TOP_LEFT: Self = Self { v: VAlign::Top, h: Align::Left };
    pub const MIDDLE_CENTER: Self = Self { v: VAlign::Middle, h: Align::Center };
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::MIDDLE_CENTER
    }
}

impl FromStr for Anchor {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLayoutError { kind: "anchor", value: s.to_string() };
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(err());
        }
        let (vc, hc) = if "lrc".contains(chars[0]) {
            (chars[1], chars[0])
        } else {
            (chars[0], chars[1])
        };
        match (VAlign::from_char(vc), Align::from_char(hc)) {
            (Some(v), Some(h)) => Ok(Anchor { v, h }),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParseLayoutError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Anchor> for String {
    fn from(a: Anchor) -> String {
        let mut s = String::with_capacity(2);
        s.push(a.v.as_char());
        s.push(a.h.as_char());
        s
    }
}
