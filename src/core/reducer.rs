use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::audio_worker::{AudioBackend, AudioEvent, AudioSettings};
use crate::core::effects::{CoreDispatch, CoreEffects, PlaythroughDone, run_effects};
use crate::core::infra::{RequestKey, RequestTracker};
use crate::library::{LibraryClient, LibraryClientConfig, LibraryEvent};
use crate::messages::app::{AppCommand, AppEvent};
use crate::player::PlaybackController;
use crate::settings::AppSettings;

mod library;
mod player;

enum CoreMsg {
    Ui(AppCommand),
    Library(LibraryEvent),
    Audio(AudioEvent),
    AudioClosed,
    Playthrough(PlaythroughDone),
}

struct CoreState {
    player: PlaybackController,
    settings: AppSettings,
    request_tracker: RequestTracker<RequestKey>,
}

impl CoreState {
    fn new(settings: AppSettings) -> Self {
        Self {
            player: PlaybackController::new(settings.playthrough_policy()),
            settings,
            request_tracker: RequestTracker::new(),
        }
    }
}

/// 处理一条消息；返回 true 表示退出
fn reduce(msg: CoreMsg, state: &mut CoreState, effects: &mut CoreEffects) -> bool {
    match msg {
        CoreMsg::Ui(AppCommand::Quit) => return true,
        CoreMsg::Ui(cmd) => {
            if !library::handle_ui(&cmd, state, effects) {
                player::handle_ui(cmd, state, effects);
            }
        }
        CoreMsg::Library(evt) => library::handle_library_event(evt, state, effects),
        CoreMsg::Audio(evt) => state.player.on_audio_event(evt, effects),
        CoreMsg::AudioClosed => {
            tracing::error!("音频后端已退出");
            effects.error("音频输出不可用");
        }
        CoreMsg::Playthrough(done) => player::handle_playthrough_done(done, state, effects),
    }
    false
}

pub fn spawn_app_actor(
    cfg: LibraryClientConfig,
    settings: AppSettings,
    audio_backend: AudioBackend,
) -> Result<(mpsc::Sender<AppCommand>, mpsc::Receiver<AppEvent>), crate::error::LibraryError> {
    let library = Arc::new(LibraryClient::new(&cfg)?);
    let (tx_cmd, mut rx_cmd) = mpsc::channel::<AppCommand>(64);
    let (tx_evt, rx_evt) = mpsc::channel::<AppEvent>(256);

    let (tx_library, mut rx_library) = crate::library::spawn_library_actor(Arc::clone(&library));
    let (tx_audio, mut rx_audio_evt) =
        crate::audio_worker::spawn_audio_worker(audio_backend, AudioSettings::from(&settings));

    tracing::info!(base_url = %library.base_url(), ?audio_backend, "core actor 启动");

    tokio::spawn(async move {
        let mut state = CoreState::new(settings);
        let mut playthroughs: JoinSet<PlaythroughDone> = JoinSet::new();
        let mut audio_closed = false;

        let mut effects = CoreEffects::default();
        let volume = state.settings.volume;
        state.player.set_volume(volume, &mut effects);
        let mut pending = Some(effects);

        loop {
            if let Some(effects) = pending.take() {
                let mut dispatch = CoreDispatch {
                    tx_audio: &tx_audio,
                    tx_evt: &tx_evt,
                    tx_library: &tx_library,
                    library: &library,
                    playthroughs: &mut playthroughs,
                };
                run_effects(effects, &mut dispatch).await;
            }

            let msg = tokio::select! {
                maybe_cmd = rx_cmd.recv() => match maybe_cmd {
                    Some(cmd) => CoreMsg::Ui(cmd),
                    None => CoreMsg::Ui(AppCommand::Quit),
                },
                Some(evt) = rx_library.recv() => CoreMsg::Library(evt),
                maybe_evt = rx_audio_evt.recv(), if !audio_closed => match maybe_evt {
                    Some(evt) => CoreMsg::Audio(evt),
                    None => {
                        audio_closed = true;
                        CoreMsg::AudioClosed
                    }
                },
                Some(joined) = playthroughs.join_next(), if !playthroughs.is_empty() => match joined {
                    Ok(done) => CoreMsg::Playthrough(done),
                    Err(e) => {
                        tracing::warn!(err = %e, "playthrough 任务异常结束");
                        continue;
                    }
                },
            };

            let mut effects = CoreEffects::default();
            if reduce(msg, &mut state, &mut effects) {
                let in_flight = playthroughs.len();
                playthroughs.abort_all();
                tracing::info!(in_flight, "core actor 退出");
                break;
            }
            pending = Some(effects);
        }
    });

    Ok((tx_cmd, rx_evt))
}
