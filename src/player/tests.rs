use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::audio_worker::{AudioCommand, AudioEvent};
use crate::core::{CoreEffect, CoreEffects};
use crate::domain::Track;

fn track(id: &str) -> Track {
    Track::new(id, 200_000, vec![])
}

fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

fn queue_ids(c: &PlaybackController) -> Vec<String> {
    c.queue()
        .entries()
        .iter()
        .map(|e| e.track.id.as_str().to_owned())
        .collect()
}

fn preloaded_id(c: &PlaybackController) -> Option<String> {
    c.preloaded_track().map(|t| t.id.as_str().to_owned())
}

fn active_target(c: &PlaybackController) -> (Slot, u64) {
    let slot = c.outputs().active();
    (slot, c.outputs().state(slot).load_id)
}

fn start_playing(c: &mut PlaybackController) {
    let (slot, load_id) = active_target(c);
    let mut fx = CoreEffects::default();
    c.on_audio_event(AudioEvent::Started { slot, load_id }, &mut fx);
}

fn progress(c: &mut PlaybackController, position_ms: u64) -> CoreEffects {
    let (slot, load_id) = active_target(c);
    let mut fx = CoreEffects::default();
    c.on_audio_event(
        AudioEvent::Progress {
            slot,
            load_id,
            position_ms,
        },
        &mut fx,
    );
    fx
}

fn playthrough_records(fx: &CoreEffects) -> usize {
    fx.actions()
        .iter()
        .filter(|a| matches!(a, CoreEffect::RecordPlaythrough { .. }))
        .count()
}

fn loads(fx: &CoreEffects) -> Vec<(String, bool)> {
    fx.audio_commands()
        .filter_map(|cmd| match cmd {
            AudioCommand::Load {
                track, autoplay, ..
            } => Some((track.id.as_str().to_owned(), *autoplay)),
            _ => None,
        })
        .collect()
}

#[test]
fn replace_installs_queue_and_cursor() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c"]), 1, &mut fx);

    assert_eq!(queue_ids(&c), ["a", "b", "c"]);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.status(), PlaybackStatus::Buffering);
    assert_eq!(
        loads(&fx),
        [("b".to_owned(), true), ("c".to_owned(), false)]
    );
    assert!(matches!(fx.actions().last(), Some(CoreEffect::EmitState(_))));
}

#[test]
fn replace_clamps_start_and_ignores_empty() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(vec![], 0, &mut fx);
    assert!(fx.actions().is_empty());
    assert_eq!(c.cursor(), None);

    c.replace(tracks(&["a", "b"]), 5, &mut fx);
    assert_eq!(c.cursor(), Some(0));
}

#[test]
fn scenario_play_next_then_remove_preloaded() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.append(tracks(&["a", "b", "c"]), &mut fx);

    c.play_at(0, &mut fx);
    assert_eq!(c.cursor(), Some(0));
    assert_eq!(preloaded_id(&c).as_deref(), Some("b"));

    start_playing(&mut c);
    let _ = progress(&mut c, 40_000);
    assert_eq!(c.playthrough(), PlaythroughStatus::InFlight);
    let before = c.activation();

    let mut fx = CoreEffects::default();
    c.next(&mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(preloaded_id(&c).as_deref(), Some("c"));
    assert_eq!(c.playthrough(), PlaythroughStatus::NotCounted);
    assert_ne!(c.activation(), before);
    // b 已经预加载过，只需要播放，不再重新装载
    assert_eq!(loads(&fx), [("c".to_owned(), false)]);

    let mut fx = CoreEffects::default();
    c.remove_at(2, &mut fx);
    assert_eq!(queue_ids(&c), ["a", "b"]);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.preloaded_track(), None);
    assert!(
        fx.audio_commands()
            .any(|cmd| matches!(cmd, AudioCommand::Clear { .. }))
    );
}

#[test]
fn next_then_previous_restores_cursor() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c", "d"]), 1, &mut fx);

    c.next(&mut fx);
    c.previous(&mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(queue_ids(&c), ["a", "b", "c", "d"]);
    assert_eq!(preloaded_id(&c).as_deref(), Some("c"));
}

#[test]
fn previous_reuses_parked_slot_as_preload() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c"]), 2, &mut fx);

    let mut fx = CoreEffects::default();
    c.previous(&mut fx);
    assert_eq!(c.cursor(), Some(1));
    // c 留在被换下的槽位里，正好是新的下一首
    assert_eq!(loads(&fx), [("b".to_owned(), true)]);
    assert_eq!(preloaded_id(&c).as_deref(), Some("c"));
}

#[test]
fn boundaries_are_no_ops() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.next(&mut fx);
    c.previous(&mut fx);
    c.remove_at(0, &mut fx);
    c.play_pause_toggle(&mut fx);
    c.move_to_next(0, &mut fx);
    c.step_by(10.0, &mut fx);
    assert!(fx.actions().is_empty());

    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    let mut fx = CoreEffects::default();
    c.previous(&mut fx);
    c.play_at(9, &mut fx);
    assert!(fx.actions().is_empty());
    assert_eq!(c.cursor(), Some(0));

    c.next(&mut fx);
    let mut fx = CoreEffects::default();
    c.next(&mut fx);
    assert!(fx.actions().is_empty());
}

#[test]
fn remove_current_advances_to_following_track() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c"]), 0, &mut fx);
    let preload_slot = c.outputs().inactive();

    let mut fx = CoreEffects::default();
    c.remove_at(0, &mut fx);
    assert_eq!(queue_ids(&c), ["b", "c"]);
    assert_eq!(c.cursor(), Some(0));
    assert_eq!(c.outputs().active(), preload_slot);
    assert_eq!(c.status(), PlaybackStatus::Buffering);
    assert_eq!(preloaded_id(&c).as_deref(), Some("c"));
}

#[test]
fn remove_last_current_stops_on_new_last() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c"]), 2, &mut fx);
    start_playing(&mut c);

    let mut fx = CoreEffects::default();
    c.remove_at(2, &mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.status(), PlaybackStatus::Idle);
    assert_eq!(c.outputs().active_entry(), None);

    // 重新按播放会把 b 装进来
    let mut fx = CoreEffects::default();
    c.play_pause_toggle(&mut fx);
    assert_eq!(loads(&fx), [("b".to_owned(), true)]);
}

#[test]
fn remove_before_cursor_keeps_current_track() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c"]), 2, &mut fx);
    let activation = c.activation();

    c.remove_at(0, &mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.queue().current().map(|e| e.track.id.as_str()), Some("c"));
    assert_eq!(c.activation(), activation);
}

#[test]
fn insert_next_preloads_new_immediate_next() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);

    let mut fx = CoreEffects::default();
    c.insert_next(tracks(&["x"]), &mut fx);
    assert_eq!(queue_ids(&c), ["a", "x", "b"]);
    assert_eq!(loads(&fx), [("x".to_owned(), false)]);

    let mut fx = CoreEffects::default();
    c.append(tracks(&["z"]), &mut fx);
    assert!(loads(&fx).is_empty());
    assert_eq!(preloaded_id(&c).as_deref(), Some("x"));
}

#[test]
fn move_to_next_repreloads() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b", "c", "d"]), 0, &mut fx);

    let mut fx = CoreEffects::default();
    c.move_to_next(3, &mut fx);
    assert_eq!(queue_ids(&c), ["a", "d", "b", "c"]);
    assert_eq!(loads(&fx), [("d".to_owned(), false)]);

    let mut fx = CoreEffects::default();
    c.move_to_next(0, &mut fx);
    assert!(fx.actions().is_empty());
}

#[test]
fn shuffle_upcoming_keeps_prefix_and_syncs_preload() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    let ids: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    c.replace(tracks(&refs), 4, &mut fx);

    c.shuffle_upcoming(&mut rng, &mut fx);
    let after = queue_ids(&c);
    assert_eq!(&after[..5], &ids[..5]);
    let mut tail = after[5..].to_vec();
    tail.sort();
    let mut expected = ids[5..].to_vec();
    expected.sort();
    assert_eq!(tail, expected);
    assert_eq!(preloaded_id(&c), Some(after[5].clone()));
}

#[test]
fn playthrough_fires_once_per_activation() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    start_playing(&mut c);

    assert_eq!(playthrough_records(&progress(&mut c, 10_000)), 0);
    assert_eq!(playthrough_records(&progress(&mut c, 31_000)), 1);
    assert_eq!(c.playthrough(), PlaythroughStatus::InFlight);

    // 往回拖再越过阈值，不能再提交
    assert_eq!(playthrough_records(&progress(&mut c, 5_000)), 0);
    assert_eq!(playthrough_records(&progress(&mut c, 35_000)), 0);

    let mut fx = CoreEffects::default();
    c.on_playthrough_recorded(c.activation(), &mut fx);
    assert_eq!(c.playthrough(), PlaythroughStatus::Submitted);
    assert_eq!(playthrough_records(&progress(&mut c, 60_000)), 0);
}

#[test]
fn playthrough_counts_short_tracks_at_ninety_nine_percent() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(vec![Track::new("short", 10_000, vec![])], 0, &mut fx);
    start_playing(&mut c);

    assert_eq!(playthrough_records(&progress(&mut c, 9_800)), 0);
    assert_eq!(playthrough_records(&progress(&mut c, 9_950)), 1);
}

#[test]
fn stale_playthrough_completion_is_ignored() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    start_playing(&mut c);
    let _ = progress(&mut c, 30_000);
    let old = c.activation();

    c.next(&mut fx);
    c.on_playthrough_recorded(old, &mut fx);
    assert_eq!(c.playthrough(), PlaythroughStatus::NotCounted);
}

#[test]
fn status_follows_output_events() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a"]), 0, &mut fx);
    assert_eq!(c.status(), PlaybackStatus::Buffering);

    start_playing(&mut c);
    assert_eq!(c.status(), PlaybackStatus::Playing);

    let mut fx = CoreEffects::default();
    c.play_pause_toggle(&mut fx);
    let slot = c.outputs().active();
    assert!(
        fx.audio_commands()
            .any(|cmd| matches!(cmd, AudioCommand::Pause { slot: s } if *s == slot))
    );

    let (slot, load_id) = active_target(&c);
    c.on_audio_event(AudioEvent::Paused { slot, load_id }, &mut fx);
    assert_eq!(c.status(), PlaybackStatus::Paused);

    // 对当前曲目 play_at 只是继续播放
    let mut fx = CoreEffects::default();
    c.play_at(0, &mut fx);
    assert!(loads(&fx).is_empty());
    assert!(
        fx.audio_commands()
            .any(|cmd| matches!(cmd, AudioCommand::Play { .. }))
    );
}

#[test]
fn stale_and_inactive_events_do_not_change_state() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    let (slot, old_load) = active_target(&c);

    c.replace(tracks(&["x", "y"]), 0, &mut fx);
    let mut fx = CoreEffects::default();
    c.on_audio_event(
        AudioEvent::Started {
            slot,
            load_id: old_load,
        },
        &mut fx,
    );
    assert_eq!(c.status(), PlaybackStatus::Buffering);
    assert!(fx.actions().is_empty());

    let inactive = c.outputs().inactive();
    let inactive_load = c.outputs().state(inactive).load_id;
    c.on_audio_event(
        AudioEvent::Started {
            slot: inactive,
            load_id: inactive_load,
        },
        &mut fx,
    );
    assert_eq!(c.status(), PlaybackStatus::Buffering);
}

#[test]
fn ended_advances_gaplessly_and_stops_at_queue_end() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    start_playing(&mut c);

    let (slot, load_id) = active_target(&c);
    let mut fx = CoreEffects::default();
    c.on_audio_event(AudioEvent::Ended { slot, load_id }, &mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_ne!(c.outputs().active(), slot);
    assert!(loads(&fx).is_empty());
    // 自然播完一定计数
    assert_eq!(playthrough_records(&fx), 1);

    start_playing(&mut c);
    let (slot, load_id) = active_target(&c);
    let mut fx = CoreEffects::default();
    c.on_audio_event(AudioEvent::Ended { slot, load_id }, &mut fx);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.status(), PlaybackStatus::Idle);
}

#[test]
fn load_failure_sets_error_flag() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a"]), 0, &mut fx);
    let (slot, load_id) = active_target(&c);

    c.on_audio_event(
        AudioEvent::Failed {
            slot,
            load_id,
            message: "HTTP 404".to_owned(),
        },
        &mut fx,
    );
    assert_eq!(c.status(), PlaybackStatus::Buffering);
    assert_eq!(c.error(), Some("HTTP 404"));
}

#[test]
fn seek_clamps_to_duration() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a"]), 0, &mut fx);

    c.seek_to(999_999, &mut fx);
    assert_eq!(c.position_ms(), 200_000);

    c.step_by(-500.0, &mut fx);
    assert_eq!(c.position_ms(), 0);

    let mut fx = CoreEffects::default();
    c.step_by(10.0, &mut fx);
    assert!(fx.audio_commands().any(|cmd| matches!(
        cmd,
        AudioCommand::Seek {
            position_ms: 10_000,
            ..
        }
    )));
}

fn fail_preload(c: &mut PlaybackController) {
    let slot = c.outputs().inactive();
    let load_id = c.outputs().state(slot).load_id;
    let mut fx = CoreEffects::default();
    c.on_audio_event(
        AudioEvent::Failed {
            slot,
            load_id,
            message: "HTTP 500".to_owned(),
        },
        &mut fx,
    );
}

#[test]
fn failed_preload_is_reloaded_on_next() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    start_playing(&mut c);
    fail_preload(&mut c);
    assert_eq!(c.preloaded_track(), None);
    assert_eq!(c.error(), None);

    let mut fx = CoreEffects::default();
    c.next(&mut fx);
    assert_eq!(loads(&fx), [("b".to_owned(), true)]);
    assert_eq!(c.cursor(), Some(1));
    assert_eq!(c.status(), PlaybackStatus::Buffering);
}

#[test]
fn failed_preload_is_reloaded_on_gapless_advance() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    start_playing(&mut c);
    fail_preload(&mut c);

    let (slot, load_id) = active_target(&c);
    let mut fx = CoreEffects::default();
    c.on_audio_event(AudioEvent::Ended { slot, load_id }, &mut fx);
    assert_eq!(loads(&fx), [("b".to_owned(), true)]);
    assert_eq!(c.cursor(), Some(1));
}

#[test]
fn play_at_current_retries_after_load_failure() {
    let mut c = PlaybackController::default();
    let mut fx = CoreEffects::default();
    c.replace(tracks(&["a", "b"]), 0, &mut fx);
    let (slot, load_id) = active_target(&c);
    c.on_audio_event(
        AudioEvent::Failed {
            slot,
            load_id,
            message: "HTTP 404".to_owned(),
        },
        &mut fx,
    );

    let mut fx = CoreEffects::default();
    c.play_at(0, &mut fx);
    assert_eq!(loads(&fx), [("a".to_owned(), true)]);
    assert_eq!(c.error(), None);
    assert_eq!(c.status(), PlaybackStatus::Buffering);
}
