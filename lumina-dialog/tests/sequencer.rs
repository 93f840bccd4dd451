use std::cell::Cell;
use std::rc::Rc;
use lumina_dialog::host::HeadlessHost;
use lumina_dialog::{
    Character, CharacterMod, Dialog, DialogError, DialogEvent, FixedClock, Item, Line, Pause,
    Script, StageChange,
};

fn dialog(script: Script, host: &HeadlessHost) -> Dialog {
    Dialog::builder(script)
        .character("a", Character::new("Alice"))
        .character("b", Character::new("Bob"))
        .host(host.host())
        .build()
        .unwrap()
}

fn shown(events: &[DialogEvent], speaker: &str, text: &str) -> bool {
    events.iter().any(|e| {
        matches!(e, DialogEvent::TextShown { speaker: s, text: t } if s == speaker && t == text)
    })
}

fn removed(events: &[DialogEvent], speaker: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, DialogEvent::TextRemoved { speaker: s } if s == speaker))
}

#[test]
fn zero_pauses_drain_in_one_call() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::pause(0.0), Item::pause(0.0), Item::pause(0.0)]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    assert!(d.in_progress());

    d.advance(0.0).unwrap();
    assert!(!d.in_progress());
    assert_eq!(host.live_decos(), 0);
}

#[test]
fn speaker_enters_before_speaking() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("Hi").time(1.0))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.1).unwrap();

    let events = host.events();
    let entry = events
        .iter()
        .position(|e| matches!(e, DialogEvent::DecoFaded { speaker, alpha, .. } if speaker == "a" && *alpha == 1.0))
        .unwrap();
    let text = events
        .iter()
        .position(|e| matches!(e, DialogEvent::TextShown { speaker, .. } if speaker == "a"))
        .unwrap();
    assert!(entry < text);
    assert_eq!(d.on_stage(), vec!["a"]);
}

#[test]
fn next_line_starts_at_continuation_time() {
    // Hi: 2 秒, ctime_factor 0.5 -> Bye 在 t=1.0 出现, Hi 在 t=2.0 消失
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("Hi").time(2.0).ctime_factor(0.5)),
        Item::say("b", Line::new("Bye").time(1.0)),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    let mut frames = Vec::new();
    for _ in 0..5 {
        d.advance(0.5).unwrap();
        frames.push(host.take_events());
    }

    assert!(shown(&frames[0], "a", "Hi"));
    assert!(!shown(&frames[1], "b", "Bye"));
    assert!(shown(&frames[2], "b", "Bye"));
    assert!(!removed(&frames[3], "a"));
    assert!(removed(&frames[4], "a"));
    assert!(removed(&frames[4], "b"));
    assert!(!d.in_progress());
}

#[test]
fn negative_ctime_factor_shortens_the_wait() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("Long one").time(4.0).ctime_factor(-0.25)),
        Item::say("b", Line::new("Next").time(1.0)),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    let mut clock = FixedClock(1.0);
    // opened at t=0
    d.tick(&mut clock).unwrap();
    host.take_events();
    for _ in 0..2 {
        d.tick(&mut clock).unwrap();
        assert!(!shown(&host.take_events(), "b", "Next"));
    }
    d.tick(&mut clock).unwrap();
    assert!(shown(&host.take_events(), "b", "Next"));
}

#[test]
fn skip_is_honored_for_untimed_lines() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("Hello there, how are you?"))]).unwrap();
    let mut d = dialog(script, &host);
    assert!(!d.config().can_skip);
    d.start().unwrap();
    d.advance(0.0).unwrap();
    host.take_events();

    assert!(d.skip());
    d.advance(0.0).unwrap();
    assert!(removed(&host.take_events(), "a"));
    assert!(!d.in_progress());
}

#[test]
fn timed_line_refuses_skip() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("Wait for it").time(5.0))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.0).unwrap();

    assert!(!d.skip());
    d.advance(0.1).unwrap();
    assert!(d.in_progress());
}

#[test]
fn skip_trigger_goes_through_input() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("Press space"))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.0).unwrap();

    host.press("space");
    d.advance(0.0).unwrap();
    assert!(!d.in_progress());
}

#[test]
fn jump_is_taken_once() {
    let host = HeadlessHost::new();
    let script = Script::new([
        ("start", vec![
            Item::say("a", Line::new("A").time(1.0).ctime(0.0).branch("next")),
            Item::say("a", Line::new("never")),
        ]),
        ("next", vec![Item::say("a", Line::new("B").time(0.5))]),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    d.advance(0.5).unwrap();
    assert_eq!(d.current_branch(), Some("next"));
    while d.in_progress() {
        d.advance(0.5).unwrap();
    }

    let events = host.events();
    let count = |text: &str| {
        events
            .iter()
            .filter(|e| matches!(e, DialogEvent::TextShown { text: t, .. } if t == text))
            .count()
    };
    assert_eq!(count("A"), 1);
    assert_eq!(count("B"), 1);
    assert_eq!(count("never"), 0);
}

#[test]
fn same_speaker_waits_for_the_previous_line() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("one").time(1.0).ctime(0.0)),
        Item::say("a", Line::new("two").time(1.0)),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    d.advance(0.5).unwrap();
    assert_eq!(d.active_items(), 1);
    d.advance(0.5).unwrap();
    assert_eq!(d.active_items(), 2);
    assert!(!shown(&host.take_events(), "a", "two"));

    d.advance(0.5).unwrap();
    let events = host.take_events();
    let gone = events.iter().position(|e| matches!(e, DialogEvent::TextRemoved { .. })).unwrap();
    let next = events
        .iter()
        .position(|e| matches!(e, DialogEvent::TextShown { text, .. } if text == "two"))
        .unwrap();
    assert!(gone < next);
}

#[test]
fn hooks_fire_in_order() {
    let host = HeadlessHost::new();
    let log = Rc::new(std::cell::RefCell::new(Vec::new()));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let script = Script::linear(vec![
        Item::say(
            "a",
            Line::new("x")
                .time(0.5)
                .on_start(move || l1.borrow_mut().push("start"))
                .on_end(move || l2.borrow_mut().push("end")),
        ),
        Pause::new(0.0).on_start(move || l3.borrow_mut().push("pause")).into(),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    while d.in_progress() {
        d.advance(0.25).unwrap();
    }
    assert_eq!(*log.borrow(), vec!["start", "end", "pause"]);
}

#[test]
fn inactive_lines_are_passed_over() {
    let host = HeadlessHost::new();
    let flag = Rc::new(Cell::new(false));
    let f = flag.clone();
    let script = Script::linear(vec![
        Item::say("a", Line::new("hidden").active(false)),
        Item::say("a", Line::new("gated").when(move || f.get())),
        Item::say("a", Line::new("shown").time(0.5)),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.0).unwrap();

    let events = host.events();
    assert!(shown(&events, "a", "shown"));
    assert!(!shown(&events, "a", "hidden"));
    assert!(!shown(&events, "a", "gated"));
}

#[test]
fn stage_changes_track_on_stage() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::Entry(StageChange::all().fade()),
        Item::pause(0.2),
        Item::Exit(StageChange::of(["a"])),
        Item::pause(0.2),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    d.advance(0.0).unwrap();
    assert_eq!(d.on_stage(), vec!["a", "b"]);
    assert!(host.events().iter().any(
        |e| matches!(e, DialogEvent::DecoFaded { speaker, duration, .. } if speaker == "b" && *duration > 0.0)
    ));

    for _ in 0..4 {
        d.advance(0.1).unwrap();
    }
    assert_eq!(d.on_stage(), vec!["b"]);
}

#[test]
fn update_char_changes_later_lines() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("before").time(0.5)),
        Item::update("a", CharacterMod::new().portrait("angry.png")),
        Item::say("a", Line::new("after").time(0.5)),
    ])
    .unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    assert_eq!(d.character("a").unwrap().portrait, None);

    d.advance(0.5).unwrap();
    d.advance(0.5).unwrap();
    assert_eq!(d.character("a").unwrap().portrait.as_deref(), Some("angry.png"));
    assert!(host.events().iter().any(|e| matches!(e, DialogEvent::DecoRebuilt { speaker } if speaker == "a")));

    // restart goes back to the declared profile
    d.start().unwrap();
    assert_eq!(d.character("a").unwrap().portrait, None);
}

#[test]
fn unknown_named_ctime_stops_the_run() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("x").named_ctime("slow"))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();

    let err = d.advance(0.0).unwrap_err();
    assert!(matches!(err, DialogError::UnknownNamed { kind: "continuation time", .. }));
    assert!(!d.in_progress());
    assert_eq!(host.live_decos(), 0);
}

#[test]
fn named_ctime_from_builder() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![
        Item::say("a", Line::new("x").time(2.0).named_ctime("quick")),
        Item::say("b", Line::new("y").time(1.0)),
    ])
    .unwrap();
    let mut d = Dialog::builder(script)
        .character("a", Character::new("Alice"))
        .character("b", Character::new("Bob"))
        .named_ctime("quick", 0.0)
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();
    assert!(!shown(&host.events(), "b", "y"));
    d.advance(0.0).unwrap();
    assert!(shown(&host.events(), "b", "y"));
}

#[test]
fn construction_errors() {
    let script = Rc::new(Script::linear(vec![Item::say("a", Line::new("x"))]).unwrap());

    let dup = Dialog::builder(script.clone())
        .character("a", Character::new("A"))
        .character("a", Character::new("A again"))
        .build();
    assert!(matches!(dup.err(), Some(DialogError::DuplicateKey { kind: "character", .. })));

    let missing = Dialog::builder(script.clone()).character("b", Character::new("B")).build();
    assert!(matches!(missing.err(), Some(DialogError::UnknownCharacter(id)) if id == "a"));

    let named = Dialog::builder(script)
        .character("a", Character::new("A").named_pos("nowhere"))
        .build();
    assert!(matches!(named.err(), Some(DialogError::UnknownNamed { kind: "position", .. })));

    let timing = Script::linear(vec![Item::say("a", Line::new("x").time(1.0).time_factor(2.0))]);
    assert!(matches!(timing.err(), Some(DialogError::ConflictingTiming("time", "time_factor"))));

    let ctime = Script::linear(vec![Item::say("a", Line::new("x").ctime(1.0).ctime_factor(0.5))]);
    assert!(matches!(ctime.err(), Some(DialogError::ConflictingTiming("ctime", "ctime_factor"))));

    let branch = Script::linear(vec![Item::say("a", Line::new("x").branch("lost"))]);
    assert!(matches!(branch.err(), Some(DialogError::UnknownBranch(b)) if b == "lost"));

    let start = Script::new([("intro", vec![Item::pause(1.0)])]);
    assert!(matches!(start.err(), Some(DialogError::MissingStartBranch)));
}

#[test]
fn end_needs_permission() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("x").time(5.0))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.0).unwrap();
    assert!(!d.end());
    assert!(d.in_progress());

    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("x").time(5.0))]).unwrap();
    let mut d = Dialog::builder(script)
        .character("a", Character::new("A"))
        .can_end(true)
        .host(host.host())
        .build()
        .unwrap();
    d.start().unwrap();
    d.advance(0.0).unwrap();
    host.press("escape");
    d.advance(0.0).unwrap();
    assert!(!d.in_progress());
    assert_eq!(host.live_elements(), 0);
    assert!(host.bindings().is_empty());
}

#[test]
fn lost_root_stops_silently() {
    let host = HeadlessHost::new();
    let script = Script::linear(vec![Item::say("a", Line::new("x").time(5.0))]).unwrap();
    let mut d = dialog(script, &host);
    d.start().unwrap();
    d.advance(0.0).unwrap();

    host.kill_root();
    assert!(d.advance(0.1).is_ok());
    assert!(!d.in_progress());
}
