use rodio::OutputStreamBuilder;
use rodio::mixer::Mixer;
use tempfile::NamedTempFile;
use tokio::select;
use tokio::sync::mpsc;

use super::AudioSettings;
use super::download::download_to_path;
use super::messages::{AudioCommand, AudioEvent};
use super::player::SlotPlayer;
use crate::domain::Track;
use crate::error::AudioError;
use crate::player::Slot;

/// 下载任务完成后回到引擎循环的结果
struct DownloadDone {
    slot: Slot,
    load_id: u64,
    result: Result<NamedTempFile, AudioError>,
}

struct AudioEngine {
    tx_evt: mpsc::Sender<AudioEvent>,
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_done: mpsc::Sender<DownloadDone>,
    rx_done: mpsc::Receiver<DownloadDone>,
    http: reqwest::Client,
    mixer: Mixer,
    settings: AudioSettings,
    volume: f32,
    a: SlotPlayer,
    b: SlotPlayer,
}

impl AudioEngine {
    fn new(
        tx_evt: mpsc::Sender<AudioEvent>,
        rx_cmd: mpsc::Receiver<AudioCommand>,
        http: reqwest::Client,
        mixer: Mixer,
        settings: AudioSettings,
    ) -> Self {
        let (tx_done, rx_done) = mpsc::channel(8);
        Self {
            tx_evt,
            rx_cmd,
            tx_done,
            rx_done,
            http,
            mixer,
            volume: settings.volume,
            settings,
            a: SlotPlayer::default(),
            b: SlotPlayer::default(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut SlotPlayer {
        match slot {
            Slot::A => &mut self.a,
            Slot::B => &mut self.b,
        }
    }

    async fn emit(&self, evt: AudioEvent) {
        let _ = self.tx_evt.send(evt).await;
    }

    async fn run(mut self) {
        let mut tick = tokio::time::interval(self.settings.progress_tick);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            select! {
                maybe_cmd = self.rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    self.handle_audio_command(cmd).await;
                }
                Some(done) = self.rx_done.recv() => {
                    self.handle_download_done(done).await;
                }
                _ = tick.tick() => {
                    self.report_progress(Slot::A).await;
                    self.report_progress(Slot::B).await;
                }
            }
        }

        self.a.reset(0);
        self.b.reset(0);
        tracing::info!("AudioWorker 已退出");
    }

    async fn handle_audio_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Load {
                slot,
                load_id,
                track,
                autoplay,
            } => self.load(slot, load_id, track, autoplay).await,
            AudioCommand::Clear { slot, load_id } => {
                tracing::debug!(?slot, load_id, "清空槽位");
                self.slot_mut(slot).reset(load_id);
            }
            AudioCommand::Play { slot } => {
                let p = self.slot_mut(slot);
                p.wants_play = true;
                let Some(sink) = p.sink.as_ref() else {
                    // 仍在下载，完成后自动开始
                    return;
                };
                sink.play();
                let load_id = p.load_id;
                self.emit(AudioEvent::Started { slot, load_id }).await;
            }
            AudioCommand::Pause { slot } => {
                let p = self.slot_mut(slot);
                p.wants_play = false;
                if let Some(sink) = p.sink.as_ref() {
                    sink.pause();
                }
                let load_id = p.load_id;
                self.emit(AudioEvent::Paused { slot, load_id }).await;
            }
            AudioCommand::Seek { slot, position_ms } => {
                let mixer = self.mixer.clone();
                let volume = self.volume;
                let p = self.slot_mut(slot);
                let load_id = p.load_id;
                match p.rebuild(&mixer, position_ms, volume) {
                    Ok(()) if p.sink.is_some() => {
                        let position_ms = p.position_ms();
                        self.emit(AudioEvent::Progress {
                            slot,
                            load_id,
                            position_ms,
                        })
                        .await;
                    }
                    Ok(()) => {}
                    Err(e) => {
                        tracing::warn!(?slot, position_ms, err = %e, "Seek 失败");
                        self.emit(AudioEvent::Failed {
                            slot,
                            load_id,
                            message: e.to_string(),
                        })
                        .await;
                    }
                }
            }
            AudioCommand::SetVolume(v) => {
                self.volume = v.clamp(0.0, 2.0);
                for p in [&self.a, &self.b] {
                    if let Some(sink) = p.sink.as_ref() {
                        sink.set_volume(self.volume);
                    }
                }
            }
        }
    }

    async fn load(&mut self, slot: Slot, load_id: u64, track: Track, autoplay: bool) {
        let title = track.display_title();
        let source = track
            .preferred_source(&self.settings.preferred_mime_types)
            .cloned();

        let http = self.http.clone();
        let retry = self.settings.retry;
        let tx_done = self.tx_done.clone();
        let p = self.slot_mut(slot);
        p.reset(load_id);
        p.title = title.clone();
        p.wants_play = autoplay;

        let Some(source) = source else {
            let err = AudioError::NoSource {
                track_id: track.id.to_string(),
            };
            tracing::warn!(?slot, load_id, err = %err, "无法装载曲目");
            self.emit(AudioEvent::Failed {
                slot,
                load_id,
                message: err.to_string(),
            })
            .await;
            return;
        };

        tracing::info!(
            ?slot,
            load_id,
            autoplay,
            title = %title,
            mime = %source.mime_type,
            "开始装载"
        );
        p.download = Some(tokio::spawn(async move {
            let result = async {
                let file = tempfile::Builder::new()
                    .prefix("jukebox-")
                    .tempfile()
                    .map_err(|source| AudioError::OpenFile {
                        title: title.clone(),
                        source,
                    })?;
                download_to_path(&http, file.path(), &source.url, &title, retry).await?;
                Ok::<_, AudioError>(file)
            }
            .await;
            let _ = tx_done
                .send(DownloadDone {
                    slot,
                    load_id,
                    result,
                })
                .await;
        }));
    }

    async fn handle_download_done(&mut self, done: DownloadDone) {
        let DownloadDone {
            slot,
            load_id,
            result,
        } = done;
        let mixer = self.mixer.clone();
        let volume = self.volume;
        let p = self.slot_mut(slot);
        if p.load_id != load_id {
            tracing::debug!(?slot, load_id, current = p.load_id, "丢弃过期的下载结果");
            return;
        }
        p.download = None;

        let loaded = result.and_then(|file| {
            p.file = Some(file);
            let seek_ms = p.pending_seek_ms.unwrap_or(0);
            p.rebuild(&mixer, seek_ms, volume)
        });
        match loaded {
            Ok(()) => {
                let duration_ms = p.duration_ms;
                let wants_play = p.wants_play;
                tracing::info!(?slot, load_id, title = %p.title, ?duration_ms, "装载完成");
                self.emit(AudioEvent::Loaded {
                    slot,
                    load_id,
                    duration_ms,
                })
                .await;
                if wants_play {
                    self.emit(AudioEvent::Started { slot, load_id }).await;
                }
            }
            Err(e) => {
                tracing::error!(?slot, load_id, title = %p.title, err = %e, "装载失败");
                self.emit(AudioEvent::Failed {
                    slot,
                    load_id,
                    message: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn report_progress(&mut self, slot: Slot) {
        let p = self.slot_mut(slot);
        if !p.is_playing() || p.ended_sent {
            return;
        }
        let load_id = p.load_id;
        let ended = p.sink.as_ref().is_some_and(|s| s.empty());
        let mut position_ms = p.position_ms();
        if let Some(d) = p.duration_ms {
            position_ms = position_ms.min(d);
        }
        if ended {
            p.ended_sent = true;
        }

        self.emit(AudioEvent::Progress {
            slot,
            load_id,
            position_ms,
        })
        .await;
        if ended {
            tracing::debug!(?slot, load_id, "播放结束");
            self.emit(AudioEvent::Ended { slot, load_id }).await;
        }
    }
}

pub(super) fn spawn(
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    settings: AudioSettings,
) {
    let spawned = std::thread::Builder::new()
        .name("jukebox-audio".to_owned())
        .spawn(move || run_audio_thread(rx_cmd, tx_evt, settings));
    if let Err(e) = spawned {
        tracing::error!(err = %e, "启动音频线程失败");
    }
}

/// rodio 的输出流不能跨线程，整个引擎跑在专用线程的 current_thread 运行时里
fn run_audio_thread(
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    settings: AudioSettings,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(err = %e, "创建音频线程运行时失败");
            return;
        }
    };
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, async move {
        let http = match reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .connect_timeout(settings.http_connect_timeout)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(err = %e, "初始化 HTTP 客户端失败");
                return;
            }
        };

        // 输出流需要存活到引擎退出
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(v) => v,
            Err(e) => {
                let err = AudioError::OutputStream(e.to_string());
                tracing::error!(err = %err, "初始化音频输出失败");
                return;
            }
        };
        let mixer = stream.mixer().clone();

        tracing::info!(
            tick_ms = settings.progress_tick.as_millis() as u64,
            "AudioWorker 已启动"
        );
        let engine = AudioEngine::new(tx_evt, rx_cmd, http, mixer, settings);
        engine.run().await;
        drop(stream);
    });
}
