use rand::seq::SliceRandom;

use super::CoreState;
use crate::core::effects::CoreEffects;
use crate::core::infra::RequestKey;
use crate::library::{LibraryCommand, LibraryEvent};
use crate::messages::app::AppCommand;

/// 需要先访问曲库的命令；返回 false 表示交给播放器处理
pub(super) fn handle_ui(cmd: &AppCommand, state: &mut CoreState, effects: &mut CoreEffects) -> bool {
    match cmd {
        AppCommand::PlayCollection {
            collection,
            shuffle,
        } => {
            let req_id = state.request_tracker.issue(RequestKey::Collection);
            tracing::info!(req_id, ?collection, shuffle, "请求集合曲目");
            effects.send_library(LibraryCommand::CollectionTracks {
                req_id,
                collection: collection.clone(),
                shuffle: *shuffle,
            });
            true
        }
        AppCommand::QueueSong { song_id, next } => {
            let req_id = state
                .request_tracker
                .issue(RequestKey::Song(song_id.clone()));
            tracing::info!(req_id, song_id = %song_id, next, "请求歌曲");
            effects.send_library(LibraryCommand::Song {
                req_id,
                song_id: song_id.clone(),
                next: *next,
            });
            true
        }
        _ => false,
    }
}

pub(super) fn handle_library_event(
    evt: LibraryEvent,
    state: &mut CoreState,
    effects: &mut CoreEffects,
) {
    match evt {
        LibraryEvent::CollectionTracks {
            req_id,
            collection,
            shuffle,
            mut tracks,
        } => {
            if !state.request_tracker.accept(&RequestKey::Collection, req_id) {
                tracing::debug!(req_id, "丢弃过期的集合响应");
                return;
            }
            if tracks.is_empty() {
                effects.toast(format!("{collection:?} 没有可播放的歌曲"));
                return;
            }
            if shuffle {
                tracks.shuffle(&mut rand::thread_rng());
            }
            effects.toast(format!("已载入 {} 首", tracks.len()));
            state.player.replace(tracks, 0, effects);
        }
        LibraryEvent::Song {
            req_id,
            song_id,
            next,
            track,
        } => {
            if !state
                .request_tracker
                .accept(&RequestKey::Song(song_id), req_id)
            {
                tracing::debug!(req_id, track_id = %track.id, "丢弃过期的歌曲响应");
                return;
            }
            let title = track.display_title();
            if state.player.queue().is_empty() {
                state.player.replace(vec![track], 0, effects);
                effects.toast(format!("开始播放：{title}"));
            } else if next {
                state.player.insert_next(vec![track], effects);
                effects.toast(format!("下一首播放：{title}"));
            } else {
                state.player.append(vec![track], effects);
                effects.toast(format!("已加入队列：{title}"));
            }
        }
        LibraryEvent::Error { req_id, message } => {
            if state.request_tracker.accept_id(req_id).is_none() {
                tracing::debug!(req_id, "丢弃过期的错误响应");
                return;
            }
            effects.error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_worker::AudioCommand;
    use crate::domain::Track;
    use crate::player::PlaybackStatus;
    use crate::settings::AppSettings;

    fn song_event(state: &mut CoreState, id: &str, next: bool) -> LibraryEvent {
        let req_id = state.request_tracker.issue(RequestKey::Song(id.to_owned()));
        LibraryEvent::Song {
            req_id,
            song_id: id.to_owned(),
            next,
            track: Track::new(id, 180_000, vec![]),
        }
    }

    fn loaded_ids(fx: &CoreEffects) -> Vec<(String, bool)> {
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
    fn first_song_into_empty_queue_starts_playback() {
        let mut state = CoreState::new(AppSettings::default());
        let mut fx = CoreEffects::default();
        let evt = song_event(&mut state, "s1", false);
        handle_library_event(evt, &mut state, &mut fx);

        assert_eq!(state.player.cursor(), Some(0));
        assert_eq!(state.player.status(), PlaybackStatus::Buffering);
        assert_eq!(loaded_ids(&fx), [("s1".to_owned(), true)]);
    }

    #[test]
    fn later_songs_are_appended_without_interrupting() {
        let mut state = CoreState::new(AppSettings::default());
        let mut fx = CoreEffects::default();
        let evt = song_event(&mut state, "s1", false);
        handle_library_event(evt, &mut state, &mut fx);

        let mut fx = CoreEffects::default();
        let evt = song_event(&mut state, "s2", false);
        handle_library_event(evt, &mut state, &mut fx);

        assert_eq!(state.player.queue().len(), 2);
        assert_eq!(state.player.cursor(), Some(0));
        // 只预加载，不抢占当前曲目
        assert_eq!(loaded_ids(&fx), [("s2".to_owned(), false)]);
    }
}
