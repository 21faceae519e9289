use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;

use crate::error::AudioError;

/// 一个输出槽位的播放状态（真实后端）
#[derive(Default)]
pub(super) struct SlotPlayer {
    pub load_id: u64,
    pub title: String,
    /// 用户期望的播放状态；下载完成时按它决定是否立即播放
    pub wants_play: bool,
    pub file: Option<NamedTempFile>,
    pub sink: Option<Sink>,
    pub duration_ms: Option<u64>,
    /// 重建 sink 时跳过的时长，`sink.get_pos()` 从这里起算
    pub offset_ms: u64,
    pub pending_seek_ms: Option<u64>,
    pub ended_sent: bool,
    pub download: Option<JoinHandle<()>>,
}

impl SlotPlayer {
    /// 放弃当前装载：取消下载、停止 sink、删除临时文件
    pub fn reset(&mut self, load_id: u64) {
        if let Some(task) = self.download.take() {
            task.abort();
        }
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        *self = SlotPlayer {
            load_id,
            ..SlotPlayer::default()
        };
    }

    pub fn position_ms(&self) -> u64 {
        let played = self
            .sink
            .as_ref()
            .map_or(0, |s| s.get_pos().as_millis() as u64);
        self.offset_ms.saturating_add(played)
    }

    pub fn is_playing(&self) -> bool {
        self.wants_play && self.sink.as_ref().is_some_and(|s| !s.is_paused())
    }

    /// 从头（或 `seek_ms` 处）重建 sink，保持当前的暂停状态与音量
    pub fn rebuild(&mut self, mixer: &Mixer, seek_ms: u64, volume: f32) -> Result<(), AudioError> {
        let Some(file) = self.file.as_ref() else {
            self.pending_seek_ms = Some(seek_ms);
            return Ok(());
        };
        let seek = (seek_ms > 0).then(|| Duration::from_millis(seek_ms));
        let (sink, duration_ms) = build_sink_from_path(mixer, file.path(), seek, &self.title)?;
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        sink.set_volume(volume);
        if self.wants_play {
            sink.play();
        } else {
            sink.pause();
        }
        self.sink = Some(sink);
        self.duration_ms = duration_ms;
        self.offset_ms = seek_ms;
        self.pending_seek_ms = None;
        self.ended_sent = false;
        Ok(())
    }
}

fn build_sink_from_path(
    mixer: &Mixer,
    path: &Path,
    seek: Option<Duration>,
    title: &str,
) -> Result<(Sink, Option<u64>), AudioError> {
    let file = File::open(path).map_err(|source| AudioError::OpenFile {
        title: title.to_owned(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        title: title.to_owned(),
        source: Box::new(e),
    })?;
    let duration_ms = decoder.total_duration().map(|d| d.as_millis() as u64);
    let source: Box<dyn Source + Send> = if let Some(seek) = seek {
        Box::new(decoder.skip_duration(seek))
    } else {
        Box::new(decoder)
    };

    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.append(source);
    Ok((sink, duration_ms))
}
