use rand::Rng;
use serde::Serialize;

use crate::audio_worker::{AudioCommand, AudioEvent};
use crate::core::CoreEffects;
use crate::domain::{EntryId, Track};
use crate::queue::{PlayQueue, QueueEntry};

use super::outputs::{DualOutputs, Slot};
use super::playthrough::{PlaythroughPolicy, PlaythroughStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Buffering,
    Playing,
    Paused,
}

/// 渲染层看到的只读快照
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub entries: Vec<QueueEntry>,
    pub cursor: Option<usize>,
    pub status: PlaybackStatus,
    pub playthrough: PlaythroughStatus,
    pub activation: u64,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub active_slot: Slot,
    pub preloaded: Option<EntryId>,
    pub volume: f32,
    pub error: Option<String>,
}

impl PlayerSnapshot {
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|pos| self.entries.get(pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// 直接装进当前 active 槽位
    Load,
    /// 交换槽位后再装载，旧曲目留在 inactive 槽位
    Swap,
}

/// 播放队列控制器
///
/// 同步状态机：每个操作立即完成，把要做的 IO 记录进 [`CoreEffects`]，
/// 由 actor 执行。成功修改状态后都会追加一次 `EmitState`。
#[derive(Debug)]
pub struct PlaybackController {
    queue: PlayQueue,
    outputs: DualOutputs,
    status: PlaybackStatus,
    playthrough: PlaythroughStatus,
    policy: PlaythroughPolicy,
    activation: u64,
    position_ms: u64,
    duration_ms: u64,
    volume: f32,
    error: Option<String>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaythroughPolicy::default())
    }
}

impl PlaybackController {
    pub fn new(policy: PlaythroughPolicy) -> Self {
        Self {
            queue: PlayQueue::new(),
            outputs: DualOutputs::default(),
            status: PlaybackStatus::Idle,
            playthrough: PlaythroughStatus::NotCounted,
            policy,
            activation: 0,
            position_ms: 0,
            duration_ms: 0,
            volume: 1.0,
            error: None,
        }
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn cursor(&self) -> Option<usize> {
        self.queue.cursor()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn playthrough(&self) -> PlaythroughStatus {
        self.playthrough
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn outputs(&self) -> &DualOutputs {
        &self.outputs
    }

    /// inactive 槽位里预加载的曲目
    pub fn preloaded_track(&self) -> Option<&Track> {
        let id = self.outputs.preloaded_entry()?;
        let pos = self.queue.position_of(id)?;
        self.queue.get(pos).map(|e| &e.track)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            entries: self.queue.entries().to_vec(),
            cursor: self.queue.cursor(),
            status: self.status,
            playthrough: self.playthrough,
            activation: self.activation,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            active_slot: self.outputs.active(),
            preloaded: self.outputs.preloaded_entry(),
            volume: self.volume,
            error: self.error.clone(),
        }
    }

    pub fn replace(&mut self, tracks: Vec<Track>, start_index: usize, effects: &mut CoreEffects) {
        if tracks.is_empty() {
            tracing::debug!("replace: 曲目列表为空，忽略");
            return;
        }
        let Some(start) = self.queue.replace(tracks, start_index) else {
            return;
        };
        tracing::info!(len = self.queue.len(), start, "替换播放队列");
        self.activate(start, Transition::Load, effects);
        effects.emit_state(self);
    }

    pub fn play_at(&mut self, index: usize, effects: &mut CoreEffects) {
        let Some(entry_id) = self.queue.get(index).map(|e| e.id) else {
            tracing::debug!(index, len = self.queue.len(), "play_at: 下标越界，忽略");
            return;
        };
        // 加载失败的当前曲目重新走 Load
        if self.queue.cursor() == Some(index)
            && self.outputs.active_entry() == Some(entry_id)
            && self.error.is_none()
        {
            self.resume_in_place(effects);
        } else {
            self.activate(index, Transition::Load, effects);
        }
        effects.emit_state(self);
    }

    pub fn next(&mut self, effects: &mut CoreEffects) {
        let Some(pos) = self.queue.cursor() else {
            return;
        };
        if pos + 1 >= self.queue.len() {
            return;
        }
        self.activate(pos + 1, Transition::Swap, effects);
        effects.emit_state(self);
    }

    pub fn previous(&mut self, effects: &mut CoreEffects) {
        let Some(pos) = self.queue.cursor() else {
            return;
        };
        if pos == 0 {
            return;
        }
        self.activate(pos - 1, Transition::Swap, effects);
        effects.emit_state(self);
    }

    pub fn insert_next(&mut self, tracks: Vec<Track>, effects: &mut CoreEffects) {
        if tracks.is_empty() {
            return;
        }
        let at = self.queue.insert_next(tracks);
        tracing::debug!(at, len = self.queue.len(), "插入到下一首");
        self.sync_preload(effects);
        effects.emit_state(self);
    }

    pub fn append(&mut self, tracks: Vec<Track>, effects: &mut CoreEffects) {
        if tracks.is_empty() {
            return;
        }
        let at = self.queue.append(tracks);
        tracing::debug!(at, len = self.queue.len(), "追加到队尾");
        self.sync_preload(effects);
        effects.emit_state(self);
    }

    pub fn remove_at(&mut self, index: usize, effects: &mut CoreEffects) {
        let was_current = self.queue.cursor() == Some(index);
        let Some(removed) = self.queue.remove(index) else {
            tracing::debug!(index, len = self.queue.len(), "remove_at: 下标越界，忽略");
            return;
        };
        tracing::debug!(index, track_id = %removed.track.id, was_current, "移出队列");

        if was_current {
            match self.queue.cursor() {
                Some(pos) if pos == index => self.activate(pos, Transition::Swap, effects),
                _ => self.stop(effects),
            }
        } else {
            self.sync_preload(effects);
        }
        effects.emit_state(self);
    }

    pub fn move_to_next(&mut self, index: usize, effects: &mut CoreEffects) {
        if !self.queue.move_to_next(index) {
            return;
        }
        self.sync_preload(effects);
        effects.emit_state(self);
    }

    pub fn shuffle_upcoming<R: Rng + ?Sized>(&mut self, rng: &mut R, effects: &mut CoreEffects) {
        if self.queue.is_empty() {
            return;
        }
        self.queue.shuffle_upcoming(rng);
        self.sync_preload(effects);
        effects.emit_state(self);
    }

    pub fn play_pause_toggle(&mut self, effects: &mut CoreEffects) {
        if self.queue.is_empty() {
            return;
        }
        let Some(pos) = self.queue.cursor() else {
            self.play_at(0, effects);
            return;
        };
        let slot = self.outputs.active();
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Buffering => {
                effects.send_audio(AudioCommand::Pause { slot });
            }
            PlaybackStatus::Paused => {
                effects.send_audio(AudioCommand::Play { slot });
            }
            PlaybackStatus::Idle => {
                self.play_at(pos, effects);
                return;
            }
        }
        effects.emit_state(self);
    }

    pub fn step_by(&mut self, seconds: f64, effects: &mut CoreEffects) {
        if !seconds.is_finite() {
            return;
        }
        let target = (self.position_ms as f64 + seconds * 1000.0).max(0.0).round() as u64;
        self.seek_to(target, effects);
    }

    pub fn seek_to(&mut self, position_ms: u64, effects: &mut CoreEffects) {
        if self.outputs.active_entry().is_none() {
            return;
        }
        let target = if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        };
        self.position_ms = target;
        effects.send_audio(AudioCommand::Seek {
            slot: self.outputs.active(),
            position_ms: target,
        });
        effects.emit_state(self);
    }

    pub fn set_volume(&mut self, volume: f32, effects: &mut CoreEffects) {
        self.volume = volume.clamp(0.0, 2.0);
        effects.send_audio(AudioCommand::SetVolume(self.volume));
        effects.emit_state(self);
    }

    pub fn on_audio_event(&mut self, evt: AudioEvent, effects: &mut CoreEffects) {
        let (slot, load_id) = evt.target();
        if !self.outputs.accepts(slot, load_id) {
            tracing::trace!(?slot, load_id, "丢弃过期的输出事件");
            return;
        }

        if slot != self.outputs.active() {
            match evt {
                AudioEvent::Failed { message, .. } => {
                    tracing::warn!(?slot, load_id, err = %message, "预加载失败");
                    // 槽位没有可播放的内容，激活时必须重新 Load
                    self.outputs.assign(slot, None);
                }
                AudioEvent::Loaded { duration_ms, .. } => {
                    tracing::debug!(?slot, load_id, ?duration_ms, "预加载完成");
                }
                _ => {}
            }
            return;
        }

        match evt {
            AudioEvent::Loaded { duration_ms, .. } => {
                if let Some(d) = duration_ms
                    && self.duration_ms == 0
                {
                    self.duration_ms = d;
                }
            }
            AudioEvent::Started { .. } => {
                self.status = PlaybackStatus::Playing;
                self.error = None;
            }
            AudioEvent::Paused { .. } => {
                self.status = PlaybackStatus::Paused;
            }
            AudioEvent::Progress { position_ms, .. } => {
                self.position_ms = position_ms;
                self.check_playthrough(effects);
            }
            AudioEvent::Ended { .. } => {
                self.on_track_ended(effects);
            }
            AudioEvent::Failed { message, .. } => {
                tracing::warn!(?slot, load_id, err = %message, "当前曲目加载失败");
                self.error = Some(message);
            }
        }
        effects.emit_state(self);
    }

    pub fn on_playthrough_recorded(&mut self, activation: u64, effects: &mut CoreEffects) {
        if activation != self.activation || self.playthrough != PlaythroughStatus::InFlight {
            return;
        }
        self.playthrough = PlaythroughStatus::Submitted;
        effects.emit_state(self);
    }

    fn resume_in_place(&mut self, effects: &mut CoreEffects) {
        let slot = self.outputs.active();
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Buffering => {}
            PlaybackStatus::Paused => effects.send_audio(AudioCommand::Play { slot }),
            PlaybackStatus::Idle => {
                // 播完停在末尾，从头再来一次
                self.begin_activation(self.current_duration());
                self.status = PlaybackStatus::Buffering;
                effects.send_audio(AudioCommand::Seek {
                    slot,
                    position_ms: 0,
                });
                effects.send_audio(AudioCommand::Play { slot });
            }
        }
    }

    fn activate(&mut self, index: usize, transition: Transition, effects: &mut CoreEffects) {
        let Some(entry) = self.queue.get(index).cloned() else {
            return;
        };
        self.queue.set_cursor(index);
        let previous = self.outputs.active();

        if self.outputs.preloaded_entry() == Some(entry.id) {
            self.outputs.swap();
            self.park(previous, effects);
            effects.send_audio(AudioCommand::Play {
                slot: self.outputs.active(),
            });
        } else {
            let slot = match transition {
                Transition::Load => previous,
                Transition::Swap => {
                    self.outputs.swap();
                    self.park(previous, effects);
                    self.outputs.active()
                }
            };
            let load_id = self.outputs.assign(slot, Some(entry.id));
            effects.send_audio_warn(
                AudioCommand::Load {
                    slot,
                    load_id,
                    track: entry.track.clone(),
                    autoplay: true,
                },
                "AudioWorker 通道已关闭：Load 发送失败",
            );
        }

        tracing::debug!(
            index,
            track_id = %entry.track.id,
            slot = ?self.outputs.active(),
            "切换当前曲目"
        );
        self.begin_activation(entry.track.duration_ms);
        self.status = PlaybackStatus::Buffering;
        self.sync_preload(effects);
    }

    /// 离开 active 角色的槽位：暂停并倒回开头，留作可复用的缓冲
    fn park(&mut self, slot: Slot, effects: &mut CoreEffects) {
        if self.outputs.state(slot).entry.is_none() {
            return;
        }
        effects.send_audio(AudioCommand::Pause { slot });
        effects.send_audio(AudioCommand::Seek {
            slot,
            position_ms: 0,
        });
    }

    /// 让 inactive 槽位与"下一首"保持一致
    fn sync_preload(&mut self, effects: &mut CoreEffects) {
        let slot = self.outputs.inactive();
        let held = self.outputs.state(slot).entry;
        match self.queue.peek_next().cloned() {
            Some(next) if held == Some(next.id) => {}
            Some(next) => {
                let load_id = self.outputs.assign(slot, Some(next.id));
                tracing::debug!(?slot, load_id, track_id = %next.track.id, "预加载下一首");
                effects.send_audio(AudioCommand::Load {
                    slot,
                    load_id,
                    track: next.track,
                    autoplay: false,
                });
            }
            None if held.is_some() => {
                let load_id = self.outputs.assign(slot, None);
                effects.send_audio(AudioCommand::Clear { slot, load_id });
            }
            None => {}
        }
    }

    /// 当前曲目被移出且后面没有曲目：停止，游标留在新的末尾
    fn stop(&mut self, effects: &mut CoreEffects) {
        let slot = self.outputs.active();
        if self.outputs.state(slot).entry.is_some() {
            let load_id = self.outputs.assign(slot, None);
            effects.send_audio(AudioCommand::Clear { slot, load_id });
        }
        self.begin_activation(self.current_duration());
        self.status = PlaybackStatus::Idle;
        self.sync_preload(effects);
    }

    fn on_track_ended(&mut self, effects: &mut CoreEffects) {
        if self.duration_ms > 0 {
            self.position_ms = self.duration_ms;
        }
        self.check_playthrough(effects);

        match self.queue.cursor() {
            Some(pos) if pos + 1 < self.queue.len() => {
                self.activate(pos + 1, Transition::Swap, effects);
            }
            _ => {
                tracing::info!("队列播放结束");
                self.status = PlaybackStatus::Idle;
            }
        }
    }

    fn check_playthrough(&mut self, effects: &mut CoreEffects) {
        if self.playthrough != PlaythroughStatus::NotCounted {
            return;
        }
        let Some(entry) = self.queue.current() else {
            return;
        };
        if !self.policy.is_reached(self.position_ms, self.duration_ms) {
            return;
        }
        self.playthrough = PlaythroughStatus::InFlight;
        effects.record_playthrough(self.activation, entry.track.id.clone());
    }

    fn begin_activation(&mut self, duration_ms: u64) {
        self.activation = self.activation.wrapping_add(1);
        self.playthrough = PlaythroughStatus::NotCounted;
        self.position_ms = 0;
        self.duration_ms = duration_ms;
        self.error = None;
    }

    fn current_duration(&self) -> u64 {
        self.queue.current().map_or(0, |e| e.track.duration_ms)
    }
}
