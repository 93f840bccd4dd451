use lumina_ui::{Align, Anchor, Rect, VAlign, Vec2, segment_intersect};

#[test]
fn test_clip_to_viewport() {
    let screen = Rect::new(-1.5, -1.0, 3.0, 2.0);

    // 从中心指向屏幕外右侧
    let hit = screen.clip_segment(Vec2::ZERO, Vec2::new(3.0, 0.0)).unwrap();
    assert!((hit.x - 1.5).abs() < 1e-6);
    assert!(hit.y.abs() < 1e-6);

    // 完全在屏幕内则不相交
    assert!(screen.clip_segment(Vec2::ZERO, Vec2::new(0.5, 0.5)).is_none());
}

#[test]
fn test_segment_intersect() {
    let c = segment_intersect(
        Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0),
        Vec2::new(0.0, 2.0), Vec2::new(2.0, 0.0),
    );
    assert_eq!(c, Some(Vec2::new(1.0, 1.0)));

    let parallel = segment_intersect(
        Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0),
    );
    assert_eq!(parallel, None);
}

#[test]
fn test_vertical_overlap() {
    let a = Rect::new(0.0, 0.0, 1.0, 1.0);
    let b = Rect::new(5.0, 1.0, 1.0, 1.0);
    let c = Rect::new(0.0, 0.5, 1.0, 1.0);
    assert!(!a.overlaps_vertically(&b));
    assert!(a.overlaps_vertically(&c));
}

#[test]
fn test_anchor_normalization() {
    let a: Anchor = "lt".parse().unwrap();
    assert_eq!(a, Anchor::TOP_LEFT);
    let b: Anchor = "bc".parse().unwrap();
    assert_eq!(b, Anchor { v: VAlign::Bottom, h: Align::Center });
    assert_eq!(String::from(b), "bc");

    assert!("xx".parse::<Anchor>().is_err());
    assert!("tlc".parse::<Anchor>().is_err());
    assert!("q".parse::<Align>().is_err());
    assert_eq!("r".parse::<Align>().unwrap(), Align::Right);
}
