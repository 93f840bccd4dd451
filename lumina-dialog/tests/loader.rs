use lumina_dialog::host::HeadlessHost;
use lumina_dialog::script::loader::DialogDocument;
use lumina_dialog::{DialogConfig, DialogError, DialogEvent};
use lumina_ui::Vec2;

const DOC: &str = r#"
[options]
can_skip = true

[options.named_positions]
left = { x = -0.5, y = 0.2 }

[characters.alice]
long_name = "Alice"
pos = "left"
played = true

[characters.bob]
long_name = "Bob"
anchor = "bl"

[character_mods.shout]
size = 16.0

[[branches.start]]
kind = "speech"
speaker = "alice"
line = { text = "Where to?", time = 0.5 }

[[branches.start]]
kind = "speech"
speaker = "alice"
choices = [
    { text = "The market", time = 0.5, branch = "market" },
    { text = "Home", time = 0.5 },
]

[[branches.market]]
kind = "speech"
speaker = "bob"
charmod = "shout"
line = "Fresh fish!"

[[branches.market]]
kind = "update_char"
speaker = "bob"
set = { portrait = "bob_happy.png" }

[[branches.market]]
kind = "exit"
speakers = ["bob"]
transition = "fade"
"#;

#[test]
fn plays_a_loaded_document() {
    let host = HeadlessHost::new();
    let doc = DialogDocument::parse(DOC).unwrap();
    let mut d = doc
        .into_builder(DialogConfig::default())
        .unwrap()
        .host(host.host())
        .build()
        .unwrap();
    assert!(d.config().can_skip);
    assert!(d.config().named_positions.contains_key("left"));

    d.start().unwrap();
    d.advance(0.0).unwrap();
    d.advance(0.5).unwrap();
    assert!(d.is_choosing());
    host.press("1");
    for _ in 0..40 {
        if !d.in_progress() {
            break;
        }
        d.advance(0.25).unwrap();
    }
    assert!(!d.in_progress());

    let events = host.events();
    assert!(events.contains(&DialogEvent::Placed { speaker: "alice".into(), pos: Vec2::new(-0.5, 0.2) }));
    assert!(events.contains(&DialogEvent::TextShown { speaker: "bob".into(), text: "Fresh fish!".into() }));
    assert!(events.contains(&DialogEvent::DecoRebuilt { speaker: "bob".into() }));
}

#[test]
fn rejects_unknown_fields() {
    let bad_character = "[characters.a]\nnickname = \"x\"\n";
    assert!(matches!(DialogDocument::parse(bad_character), Err(DialogError::Parse(_))));

    let bad_line = r#"
[[branches.start]]
kind = "speech"
speaker = "a"
line = { text = "x", tempo = 3 }
"#;
    assert!(matches!(DialogDocument::parse(bad_line), Err(DialogError::Parse(_))));

    let bad_kind = r#"
[[branches.start]]
kind = "dance"
"#;
    assert!(matches!(DialogDocument::parse(bad_kind), Err(DialogError::Parse(_))));
}

#[test]
fn rejects_unknown_branches() {
    let doc = DialogDocument::parse(
        r#"
[characters.a]

[[branches.start]]
kind = "pause"
time = 1.0
branch = "nowhere"
"#,
    )
    .unwrap();
    assert!(matches!(doc.script(), Err(DialogError::UnknownBranch(b)) if b == "nowhere"));
}

#[test]
fn rejects_bad_anchor() {
    let doc = DialogDocument::parse("[characters.a]\nanchor = \"sideways\"\n");
    assert!(doc.is_err());
}

#[test]
fn unknown_speaker_fails_at_build() {
    let doc = DialogDocument::parse(
        r#"
[[branches.start]]
kind = "speech"
speaker = "ghost"
line = "boo"
"#,
    )
    .unwrap();
    let built = doc.into_builder(DialogConfig::default()).unwrap().build();
    assert!(matches!(built.err(), Some(DialogError::UnknownCharacter(id)) if id == "ghost"));
}
