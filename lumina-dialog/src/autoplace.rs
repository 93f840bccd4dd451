use lumina_ui::{Rect, Vec2};

use crate::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move {
    /// Jump straight to the target.
    Snap,
    /// Animate to the target over this many seconds.
    Slide(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: String,
    pub pos: Vec2,
    pub mv: Move,
}

#[derive(Debug)]
struct Member {
    id: String,
    just_added: bool,
    target: Option<Vec2>,
}

/// Stacks auto-placed bubbles down from a screen corner, highest priority
/// first. Equal priorities keep the order in which members were added.
#[derive(Debug)]
pub struct Autoplacer {
    members: Vec<Member>,
    margin: Vec2,
    gap: f32,
    slide_duration: f32,
}

impl Autoplacer {
    pub fn new(cfg: &LayoutConfig) -> Self {
        Self {
            members: Vec::new(),
            margin: cfg.margin,
            gap: cfg.gap,
            slide_duration: cfg.slide_duration,
        }
    }

    /// Returns false if `id` was already stacked.
    pub fn add(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(Member { id: id.to_string(), just_added: true, target: None });
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Recomputes every slot below `origin` (the top-left screen corner).
    /// `measure` yields a member's priority and its bounds relative to its
    /// own position. Only members whose target moved are returned.
    pub fn layout(&mut self, origin: Vec2, mut measure: impl FnMut(&str) -> (i32, Rect)) -> Vec<Placement> {
        let mut order: Vec<(i32, usize, Rect)> = self
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let (prio, bounds) = measure(&m.id);
                (prio, i, bounds)
            })
            .collect();
        // sort_by is stable: equal priorities stay in insertion order
        order.sort_by(|a, b| b.0.cmp(&a.0));

        let mut offset = self.margin.y;
        let mut moves = Vec::new();
        for (_, idx, b) in order {
            let pos = origin + Vec2::new(self.margin.x - b.x, -(offset + b.top()));
            offset += b.h + self.gap;

            let m = &mut self.members[idx];
            let changed = m.target.is_none_or(|t| t.distance(pos) > 1e-3);
            if !changed {
                continue;
            }
            m.target = Some(pos);
            let mv = if m.just_added {
                m.just_added = false;
                Move::Snap
            } else {
                Move::Slide(self.slide_duration)
            };
            moves.push(Placement { id: m.id.clone(), pos, mv });
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn placer() -> Autoplacer {
        Autoplacer::new(&LayoutConfig::default())
    }

    fn bounds(h: f32) -> Rect {
        Rect::new(0.0, -h, 0.5, h)
    }

    #[test]
    fn first_placement_snaps_then_slides() {
        let mut ap = placer();
        let origin = Vec2::new(-1.0, 1.0);
        ap.add("a");
        let first = ap.layout(origin, |_| (0, bounds(0.2)));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].mv, Move::Snap);

        // 相同布局不再产生移动
        assert!(ap.layout(origin, |_| (0, bounds(0.2))).is_empty());

        ap.add("b");
        let moves = ap.layout(origin, |id| (if id == "b" { 5 } else { 0 }, bounds(0.2)));
        let a = moves.iter().find(|p| p.id == "a").unwrap();
        let b = moves.iter().find(|p| p.id == "b").unwrap();
        assert_eq!(a.mv, Move::Slide(0.25));
        assert_eq!(b.mv, Move::Snap);
        assert!(b.pos.y > a.pos.y);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut ap = placer();
        for id in ["z", "a", "m"] {
            ap.add(id);
        }
        let moves = ap.layout(Vec2::ZERO, |_| (1, bounds(0.1)));
        let ys: Vec<(String, f32)> = moves.iter().map(|p| (p.id.clone(), p.pos.y)).collect();
        assert_eq!(ys[0].0, "z");
        assert!(ys[0].1 > ys[1].1 && ys[1].1 > ys[2].1);
    }

    #[test]
    fn stacked_extents_never_overlap() {
        let heights = [0.1, 0.35, 0.05, 0.2, 0.15];
        let prios = [0, 10, 0, 100, 10];
        let mut ap = placer();
        let mut placed: FxHashMap<String, (f32, f32)> = FxHashMap::default();
        let ids: Vec<String> = (0..heights.len()).map(|i| format!("c{i}")).collect();

        // 入场与退场交错
        for step in 0..heights.len() * 2 {
            let i = step % heights.len();
            if step < heights.len() {
                ap.add(&ids[i]);
            } else if i % 2 == 0 {
                ap.remove(&ids[i]);
                placed.remove(&ids[i]);
            }
            let moves = ap.layout(Vec2::new(-1.7, 1.0), |id| {
                let k: usize = id[1..].parse().unwrap();
                (prios[k], bounds(heights[k]))
            });
            for p in moves {
                let k: usize = p.id[1..].parse().unwrap();
                let b = bounds(heights[k]).translate(p.pos);
                placed.insert(p.id, (b.y, b.top()));
            }
            let mut spans: Vec<(f32, f32)> = ap.ids().map(|id| placed[id]).collect();
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));
            for w in spans.windows(2) {
                assert!(w[0].1 <= w[1].0 + 1e-6, "overlap: {:?}", w);
            }
        }
    }
}
