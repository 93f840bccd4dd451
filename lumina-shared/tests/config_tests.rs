use serde::Deserialize;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
struct Audio {
    volume: f32,
    muted: bool,
}

#[test]
fn test_sections_and_fallbacks() {
    lumina_shared::config::init_from_str("[audio]\nvolume = 0.5\n").unwrap();
    assert!(lumina_shared::config::is_initialized());

    let audio: Audio = lumina_shared::config::get("audio");
    assert_eq!(audio, Audio { volume: 0.5, muted: false });

    // 缺失的节使用默认值
    let missing: Audio = lumina_shared::config::get("video");
    assert_eq!(missing, Audio::default());

    // 类型不匹配时同样回退
    lumina_shared::config::init_from_str("audio = 3\n").unwrap();
    let mismatch: Audio = lumina_shared::config::get("audio");
    assert_eq!(mismatch, Audio::default());
}
