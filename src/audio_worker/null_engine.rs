//! 无声后端：不下载也不解码，按固定节拍模拟播放进度。

use tokio::select;
use tokio::sync::mpsc;

use super::AudioSettings;
use super::messages::{AudioCommand, AudioEvent};
use crate::player::Slot;

#[derive(Debug, Default)]
struct NullSlot {
    load_id: u64,
    loaded: bool,
    playing: bool,
    position_ms: u64,
    duration_ms: u64,
    ended_sent: bool,
}

struct NullEngine {
    tx_evt: mpsc::Sender<AudioEvent>,
    rx_cmd: mpsc::Receiver<AudioCommand>,
    settings: AudioSettings,
    a: NullSlot,
    b: NullSlot,
}

impl NullEngine {
    fn new(
        tx_evt: mpsc::Sender<AudioEvent>,
        rx_cmd: mpsc::Receiver<AudioCommand>,
        settings: AudioSettings,
    ) -> Self {
        Self {
            tx_evt,
            rx_cmd,
            settings,
            a: NullSlot::default(),
            b: NullSlot::default(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut NullSlot {
        match slot {
            Slot::A => &mut self.a,
            Slot::B => &mut self.b,
        }
    }

    async fn run(mut self) {
        let mut tick = tokio::time::interval(self.settings.progress_tick);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let step_ms = self.settings.progress_tick.as_millis() as u64;

        loop {
            select! {
                maybe_cmd = self.rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    for evt in self.handle_audio_command(cmd) {
                        let _ = self.tx_evt.send(evt).await;
                    }
                }
                _ = tick.tick() => {
                    let mut events = self.advance(Slot::A, step_ms);
                    events.extend(self.advance(Slot::B, step_ms));
                    for evt in events {
                        let _ = self.tx_evt.send(evt).await;
                    }
                }
            }
        }
    }

    fn handle_audio_command(&mut self, cmd: AudioCommand) -> Vec<AudioEvent> {
        match cmd {
            AudioCommand::Load {
                slot,
                load_id,
                track,
                autoplay,
            } => {
                let s = self.slot_mut(slot);
                *s = NullSlot {
                    load_id,
                    ..NullSlot::default()
                };
                if track.sources.is_empty() {
                    return vec![AudioEvent::Failed {
                        slot,
                        load_id,
                        message: format!("没有可用的播放源({})", track.id),
                    }];
                }
                s.loaded = true;
                s.playing = autoplay;
                s.duration_ms = track.duration_ms;
                let mut events = vec![AudioEvent::Loaded {
                    slot,
                    load_id,
                    duration_ms: Some(track.duration_ms),
                }];
                if autoplay {
                    events.push(AudioEvent::Started { slot, load_id });
                }
                events
            }
            AudioCommand::Clear { slot, load_id } => {
                *self.slot_mut(slot) = NullSlot {
                    load_id,
                    ..NullSlot::default()
                };
                Vec::new()
            }
            AudioCommand::Play { slot } => {
                let s = self.slot_mut(slot);
                if !s.loaded {
                    return Vec::new();
                }
                s.playing = true;
                vec![AudioEvent::Started {
                    slot,
                    load_id: s.load_id,
                }]
            }
            AudioCommand::Pause { slot } => {
                let s = self.slot_mut(slot);
                s.playing = false;
                vec![AudioEvent::Paused {
                    slot,
                    load_id: s.load_id,
                }]
            }
            AudioCommand::Seek { slot, position_ms } => {
                let s = self.slot_mut(slot);
                if !s.loaded {
                    return Vec::new();
                }
                s.position_ms = position_ms.min(s.duration_ms);
                s.ended_sent = false;
                vec![AudioEvent::Progress {
                    slot,
                    load_id: s.load_id,
                    position_ms: s.position_ms,
                }]
            }
            AudioCommand::SetVolume(_) => Vec::new(),
        }
    }

    fn advance(&mut self, slot: Slot, step_ms: u64) -> Vec<AudioEvent> {
        let s = self.slot_mut(slot);
        if !s.playing || s.ended_sent {
            return Vec::new();
        }
        s.position_ms = s.position_ms.saturating_add(step_ms).min(s.duration_ms);
        let mut events = vec![AudioEvent::Progress {
            slot,
            load_id: s.load_id,
            position_ms: s.position_ms,
        }];
        if s.position_ms >= s.duration_ms {
            s.ended_sent = true;
            s.playing = false;
            events.push(AudioEvent::Ended {
                slot,
                load_id: s.load_id,
            });
        }
        events
    }
}

pub(super) fn spawn(
    rx_cmd: mpsc::Receiver<AudioCommand>,
    tx_evt: mpsc::Sender<AudioEvent>,
    settings: AudioSettings,
) {
    tracing::info!("使用无声音频后端");
    tokio::spawn(async move {
        let engine = NullEngine::new(tx_evt, rx_cmd, settings);
        engine.run().await;
    });
}
