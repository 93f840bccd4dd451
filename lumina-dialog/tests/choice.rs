use lumina_dialog::host::HeadlessHost;
use lumina_dialog::{Character, Dialog, DialogEvent, Item, Line, Script};

fn choices() -> Vec<Line> {
    vec![Line::new("Yes").time(0.5), Line::new("No").time(0.5)]
}

#[test]
fn played_speaker_picks_from_menu() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::choice("p", choices())]).unwrap();
    let mut d = Dialog::builder(script)
        .character("p", Character::new("Player").played(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();

    assert!(d.is_choosing());
    assert!(host.events().contains(&DialogEvent::MenuShown {
        options: vec!["1. Yes".to_string(), "2. No".to_string()],
    }));
    assert!(!d.skip());
    assert!(!d.select(5));

    host.take_events();
    host.press("2");
    d.advance(0.0).unwrap();
    let events = host.take_events();
    assert!(events.contains(&DialogEvent::MenuRemoved));
    assert!(events.contains(&DialogEvent::TextShown { speaker: "p".into(), text: "No".into() }));
    assert!(!d.is_choosing());
    assert!(host.bindings().iter().all(|(group, _, _)| group != "dialog-choice"));

    d.advance(0.5).unwrap();
    assert!(!d.in_progress());
}

#[test]
fn select_by_index() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::choice("p", choices())]).unwrap();
    let mut d = Dialog::builder(script)
        .character("p", Character::new("Player").played(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();

    assert!(d.select(0));
    d.advance(0.0).unwrap();
    assert!(host.events().contains(&DialogEvent::TextShown { speaker: "p".into(), text: "Yes".into() }));
}

#[test]
fn npc_picks_at_random() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::choice("n", choices())]).unwrap();
    let mut d = Dialog::builder(script)
        .character("n", Character::new("Npc"))
        .seed(7)
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();

    let events = host.events();
    assert!(!events.iter().any(|e| matches!(e, DialogEvent::MenuShown { .. })));
    let spoken = events
        .iter()
        .filter(|e| matches!(e, DialogEvent::TextShown { text, .. } if text == "Yes" || text == "No"))
        .count();
    assert_eq!(spoken, 1);
}

#[test]
fn only_active_alternatives_are_offered() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::choice("p", vec![Line::new("Hidden").active(false), Line::new("Open").time(0.5)]),
        Item::choice("p", vec![Line::new("Gone").active(false)]),
    ])
    .unwrap();
    let mut d = Dialog::builder(script)
        .character("p", Character::new("Player").played(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();
    assert!(host.events().contains(&DialogEvent::MenuShown { options: vec!["1. Open".to_string()] }));

    d.select(0);
    d.advance(0.0).unwrap();
    d.advance(0.5).unwrap();
    // the second choice has nothing to offer
    assert!(!d.in_progress());
}

#[test]
fn choice_jumps_with_the_selected_line() {
    let host = HeadlessHost::new();
    let script = Script::new([
        ("start", vec![Item::choice("p", vec![
            Line::new("Left").time(0.5).branch("left"),
            Line::new("Right").time(0.5).branch("right"),
        ])]),
        ("left", vec![Item::say("p", Line::new("went left").time(0.5))]),
        ("right", vec![Item::say("p", Line::new("went right").time(0.5))]),
    ])
    .unwrap();
    let mut d = Dialog::builder(script)
        .character("p", Character::new("Player").played(true))
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();
    host.press("2");
    while d.in_progress() {
        d.advance(0.25).unwrap();
    }
    let events = host.events();
    assert!(events.contains(&DialogEvent::TextShown { speaker: "p".into(), text: "went right".into() }));
    assert!(!events.contains(&DialogEvent::TextShown { speaker: "p".into(), text: "went left".into() }));
}
