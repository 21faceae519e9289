use jukebox::settings::{AppSettings, load_settings, save_settings};
use std::fs;

#[test]
fn settings_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();

    let s = AppSettings {
        volume: 0.42,
        step_secs: 5.0,
        playthrough_min_secs: 20,
        preferred_mime_types: vec!["audio/flac".to_owned()],
        ..AppSettings::default()
    };
    save_settings(data_dir, &s).expect("save_settings");

    let loaded = load_settings(data_dir);
    assert!((loaded.volume - 0.42).abs() < f32::EPSILON);
    assert!((loaded.step_secs - 5.0).abs() < f64::EPSILON);
    assert_eq!(loaded.playthrough_min_secs, 20);
    assert_eq!(loaded.preferred_mime_types, ["audio/flac"]);
}

#[test]
fn settings_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();
    fs::create_dir_all(data_dir).expect("create_dir_all");
    fs::write(data_dir.join("settings.json"), b"{not-json").expect("write");

    let loaded = load_settings(data_dir);
    assert_eq!(loaded.playthrough_min_secs, AppSettings::default().playthrough_min_secs);
}

#[test]
fn settings_missing_file_is_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = load_settings(&dir.path().join("nope"));
    assert_eq!(loaded.progress_tick_ms, 250);
}
