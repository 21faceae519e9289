use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::audio_worker::AudioCommand;
use crate::domain::TrackId;
use crate::error::LibraryError;
use crate::library::{LibraryClient, LibraryCommand};
use crate::messages::app::AppEvent;
use crate::player::{PlaybackController, PlayerSnapshot};

#[derive(Default)]
pub struct CoreEffects {
    pub(crate) actions: Vec<CoreEffect>,
}

#[derive(Debug)]
pub enum CoreEffect {
    EmitState(Box<PlayerSnapshot>),
    EmitToast(String),
    EmitError(String),
    SendAudio {
        cmd: AudioCommand,
        warn: Option<&'static str>,
    },
    SendLibrary(LibraryCommand),
    /// 提交一次 playthrough；`activation` 用于回写时核对是否还是同一次激活
    RecordPlaythrough { activation: u64, track_id: TrackId },
}

impl CoreEffects {
    pub fn emit_state(&mut self, player: &PlaybackController) {
        self.actions
            .push(CoreEffect::EmitState(Box::new(player.snapshot())));
    }

    pub fn send_audio(&mut self, cmd: AudioCommand) {
        self.actions.push(CoreEffect::SendAudio { cmd, warn: None });
    }

    pub fn send_audio_warn(&mut self, cmd: AudioCommand, warn: &'static str) {
        self.actions.push(CoreEffect::SendAudio {
            cmd,
            warn: Some(warn),
        });
    }

    pub fn send_library(&mut self, cmd: LibraryCommand) {
        self.actions.push(CoreEffect::SendLibrary(cmd));
    }

    pub fn record_playthrough(&mut self, activation: u64, track_id: TrackId) {
        self.actions
            .push(CoreEffect::RecordPlaythrough { activation, track_id });
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.actions.push(CoreEffect::EmitToast(message.into()));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.actions.push(CoreEffect::EmitError(message.into()));
    }

    pub fn actions(&self) -> &[CoreEffect] {
        &self.actions
    }

    pub fn audio_commands(&self) -> impl Iterator<Item = &AudioCommand> {
        self.actions.iter().filter_map(|a| match a {
            CoreEffect::SendAudio { cmd, .. } => Some(cmd),
            _ => None,
        })
    }
}

/// playthrough 提交任务的结果，回到 actor 主循环后再更新状态
#[derive(Debug)]
pub struct PlaythroughDone {
    pub activation: u64,
    pub track_id: TrackId,
    pub result: Result<(), LibraryError>,
}

pub struct CoreDispatch<'a> {
    pub(super) tx_audio: &'a mpsc::Sender<AudioCommand>,
    pub(super) tx_evt: &'a mpsc::Sender<AppEvent>,
    pub(super) tx_library: &'a mpsc::Sender<LibraryCommand>,
    pub(super) library: &'a Arc<LibraryClient>,
    pub(super) playthroughs: &'a mut JoinSet<PlaythroughDone>,
}

pub async fn run_effects(effects: CoreEffects, dispatch: &mut CoreDispatch<'_>) {
    for effect in effects.actions {
        match effect {
            CoreEffect::EmitState(snapshot) => {
                if let Err(e) = dispatch.tx_evt.send(AppEvent::State(snapshot)).await {
                    tracing::debug!(err = %e, "事件通道已关闭");
                }
            }
            CoreEffect::EmitToast(msg) => {
                if let Err(e) = dispatch.tx_evt.send(AppEvent::Toast(msg)).await {
                    tracing::debug!(err = %e, "事件通道已关闭");
                }
            }
            CoreEffect::EmitError(msg) => {
                if let Err(e) = dispatch.tx_evt.send(AppEvent::Error(msg)).await {
                    tracing::debug!(err = %e, "事件通道已关闭");
                }
            }
            CoreEffect::SendAudio { cmd, warn } => {
                if let Err(e) = dispatch.tx_audio.send(cmd).await
                    && let Some(ctx) = warn
                {
                    tracing::warn!(err = %e, "{ctx}");
                }
            }
            CoreEffect::SendLibrary(cmd) => {
                if let Err(e) = dispatch.tx_library.send(cmd).await {
                    tracing::warn!(err = %e, "发送曲库请求失败");
                }
            }
            CoreEffect::RecordPlaythrough {
                activation,
                track_id,
            } => {
                let library = Arc::clone(dispatch.library);
                let timestamp_ms = chrono::Utc::now().timestamp_millis();
                tracing::info!(%track_id, activation, timestamp_ms, "提交 playthrough");
                dispatch.playthroughs.spawn(async move {
                    let result = library.record_playthrough(&track_id, timestamp_ms).await;
                    PlaythroughDone {
                        activation,
                        track_id,
                        result,
                    }
                });
            }
        }
    }
}
