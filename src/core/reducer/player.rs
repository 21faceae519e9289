use super::CoreState;
use crate::core::effects::{CoreEffects, PlaythroughDone};
use crate::messages::app::AppCommand;

pub(super) fn handle_ui(cmd: AppCommand, state: &mut CoreState, effects: &mut CoreEffects) {
    let player = &mut state.player;
    match cmd {
        AppCommand::PlayTracks { tracks, start } => player.replace(tracks, start, effects),
        AppCommand::InsertNext(tracks) => player.insert_next(tracks, effects),
        AppCommand::Append(tracks) => player.append(tracks, effects),
        AppCommand::PlayAt(i) => player.play_at(i, effects),
        AppCommand::RemoveAt(i) => player.remove_at(i, effects),
        AppCommand::MoveToNext(i) => player.move_to_next(i, effects),
        AppCommand::ShuffleUpcoming => player.shuffle_upcoming(&mut rand::thread_rng(), effects),
        AppCommand::PlayerTogglePause => player.play_pause_toggle(effects),
        AppCommand::PlayerNext => player.next(effects),
        AppCommand::PlayerPrev => player.previous(effects),
        AppCommand::PlayerStepSecs(secs) => player.step_by(secs, effects),
        AppCommand::PlayerStepForward => player.step_by(state.settings.step_secs, effects),
        AppCommand::PlayerStepBackward => player.step_by(-state.settings.step_secs, effects),
        AppCommand::PlayerSeekToMs(ms) => player.seek_to(ms, effects),
        AppCommand::PlayerSetVolume(v) => player.set_volume(v, effects),
        AppCommand::PlayCollection { .. } | AppCommand::QueueSong { .. } | AppCommand::Quit => {
            tracing::debug!(?cmd, "命令不由播放器处理");
        }
    }
}

pub(super) fn handle_playthrough_done(
    done: PlaythroughDone,
    state: &mut CoreState,
    effects: &mut CoreEffects,
) {
    let PlaythroughDone {
        activation,
        track_id,
        result,
    } = done;
    match result {
        Ok(()) => tracing::info!(%track_id, activation, "playthrough 已记录"),
        // 不重试：本次激活仍视为已计数
        Err(e) => tracing::warn!(%track_id, activation, err = %e, "playthrough 提交失败"),
    }
    state.player.on_playthrough_recorded(activation, effects);
}
