mod download;
mod engine;
mod messages;
mod null_engine;
mod player;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::settings::AppSettings;

pub use download::{RetryPolicy, download_to_path};
pub use messages::{AudioCommand, AudioEvent};

/// 选择音频后端：真实输出设备，或无声的模拟后端（测试 / 无声卡环境）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    Real,
    Null,
}

#[derive(Debug, Clone)]
pub struct AudioSettings {
    pub volume: f32,
    pub preferred_mime_types: Vec<String>,
    pub progress_tick: Duration,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub http_connect_timeout: Duration,
}

impl From<&AppSettings> for AudioSettings {
    fn from(s: &AppSettings) -> Self {
        Self {
            volume: s.volume.clamp(0.0, 2.0),
            preferred_mime_types: s.preferred_mime_types.clone(),
            progress_tick: Duration::from_millis(s.progress_tick_ms.max(10)),
            retry: RetryPolicy {
                retries: s.download_retries,
                backoff_ms: s.download_retry_backoff_ms,
                backoff_max_ms: s.download_retry_backoff_max_ms,
            },
            http_timeout: Duration::from_secs(s.http_timeout_secs.max(1)),
            http_connect_timeout: Duration::from_secs(s.http_connect_timeout_secs.max(1)),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::from(&AppSettings::default())
    }
}

pub fn spawn_audio_worker(
    backend: AudioBackend,
    settings: AudioSettings,
) -> (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>) {
    let (tx_cmd, rx_cmd) = mpsc::channel::<AudioCommand>(64);
    let (tx_evt, rx_evt) = mpsc::channel::<AudioEvent>(256);

    match backend {
        AudioBackend::Real => engine::spawn(rx_cmd, tx_evt, settings),
        AudioBackend::Null => null_engine::spawn(rx_cmd, tx_evt, settings),
    }

    (tx_cmd, rx_evt)
}
