//! Presentation primitives shared by the dialogue engine and its hosts.

pub mod types;

pub use types::{Align, Anchor, Color, ParseLayoutError, Rect, VAlign, Vec2, segment_intersect};
