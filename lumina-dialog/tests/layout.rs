use lumina_dialog::host::{HeadlessHost, Projection};
use lumina_dialog::{Character, Dialog, DialogEvent, Item, Line, Script};
use lumina_ui::Vec2;

fn placed(events: &[DialogEvent], who: &str) -> Option<Vec2> {
    events.iter().find_map(|e| match e {
        DialogEvent::Placed { speaker, pos } if speaker == who => Some(*pos),
        _ => None,
    })
}

fn slid(events: &[DialogEvent], who: &str) -> Option<Vec2> {
    events.iter().find_map(|e| match e {
        DialogEvent::Slid { speaker, pos, .. } if speaker == who => Some(*pos),
        _ => None,
    })
}

#[test]
fn stack_snaps_then_slides() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("first").time(1.0).ctime(0.0)),
        Item::say("b", Line::new("second").time(3.0)),
    ])
    .unwrap();
    let mut d = Dialog::builder(script)
        .character("a", Character::new("A").autoplace(true))
        .character("b", Character::new("B").autoplace(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();

    d.advance(0.0).unwrap();
    let top = placed(&host.take_events(), "a").unwrap();

    d.advance(0.0).unwrap();
    let events = host.take_events();
    let below = placed(&events, "b").unwrap();
    assert!(below.y < top.y);
    assert!(placed(&events, "a").is_none());

    // a 说完后自动退场, b 滑到顶部
    d.advance(1.0).unwrap();
    let events = host.take_events();
    assert!(events.iter().any(
        |e| matches!(e, DialogEvent::DecoFaded { speaker, alpha, .. } if speaker == "a" && *alpha == 0.0)
    ));
    assert_eq!(slid(&events, "b"), Some(top));
    assert_eq!(d.on_stage(), vec!["b"]);
}

#[test]
fn played_character_goes_on_top() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("n", Line::new("hello").time(2.0).ctime(0.0)),
        Item::say("p", Line::new("hi").time(2.0)),
    ])
    .unwrap();
    let mut d = Dialog::builder(script)
        .character("n", Character::new("Npc").autoplace(true))
        .character("p", Character::new("Player").played(true).autoplace(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();

    d.advance(0.0).unwrap();
    let top = placed(&host.take_events(), "n").unwrap();

    d.advance(0.0).unwrap();
    let events = host.take_events();
    assert_eq!(placed(&events, "p"), Some(top));
    let moved = slid(&events, "n").unwrap();
    assert!(moved.y < top.y);
}

#[test]
fn tracked_bubble_follows_its_anchor() {
    let host = HeadlessHost::new();
    host.set_anchor("guard", Some(Projection { pos: Vec2::new(0.2, 0.1), behind: false }));
    let script = Script::linear(vec![Item::say("g", Line::new("Halt!").time(1.0))]).unwrap();
    let mut d = Dialog::builder(script)
        .character("g", Character::new("Guard").tracking("guard"))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();

    d.advance(0.0).unwrap();
    assert_eq!(placed(&host.take_events(), "g"), Some(Vec2::new(0.2, 0.1)));

    // unchanged anchor, no new placement
    d.advance(0.1).unwrap();
    assert_eq!(placed(&host.take_events(), "g"), None);

    host.set_anchor("guard", Some(Projection { pos: Vec2::new(5.0, 0.0), behind: false }));
    d.advance(0.1).unwrap();
    let events = host.take_events();
    let pos = placed(&events, "g").unwrap();
    assert!(pos.x < 5.0);
    assert!(events.iter().any(|e| matches!(e, DialogEvent::ArrowShown { speaker, .. } if speaker == "g")));

    // lost projection keeps the last position
    host.set_anchor("guard", None);
    d.advance(0.1).unwrap();
    assert_eq!(placed(&host.take_events(), "g"), None);

    d.advance(1.0).unwrap();
    assert!(host.events().iter().any(|e| matches!(e, DialogEvent::ArrowHidden { speaker } if speaker == "g")));
}

#[test]
fn fixed_speaker_is_placed_at_its_position() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("x").time(1.0))]).unwrap();
    let mut d = Dialog::builder(script)
        .character("a", Character::new("A").named_pos("left"))
        .named_position("left", Vec2::new(-0.5, 0.3))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();
    assert_eq!(placed(&host.events(), "a"), Some(Vec2::new(-0.5, 0.3)));
}
