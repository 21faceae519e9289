use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::player::PlaythroughPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    // 播放器设置
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_step_secs")]
    pub step_secs: f64,
    #[serde(default = "default_preferred_mime_types")]
    pub preferred_mime_types: Vec<String>,

    // playthrough 计数阈值
    #[serde(default = "default_playthrough_min_secs")]
    pub playthrough_min_secs: u64,
    #[serde(default = "default_playthrough_min_ratio")]
    pub playthrough_min_ratio: f64,

    // 网络/下载设置
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_http_connect_timeout_secs")]
    pub http_connect_timeout_secs: u64,
    #[serde(default = "default_download_retries")]
    pub download_retries: u32,
    #[serde(default = "default_download_retry_backoff_ms")]
    pub download_retry_backoff_ms: u64,
    #[serde(default = "default_download_retry_backoff_max_ms")]
    pub download_retry_backoff_max_ms: u64,

    /// 输出进度事件的间隔
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            step_secs: default_step_secs(),
            preferred_mime_types: default_preferred_mime_types(),
            playthrough_min_secs: default_playthrough_min_secs(),
            playthrough_min_ratio: default_playthrough_min_ratio(),
            http_timeout_secs: default_http_timeout_secs(),
            http_connect_timeout_secs: default_http_connect_timeout_secs(),
            download_retries: default_download_retries(),
            download_retry_backoff_ms: default_download_retry_backoff_ms(),
            download_retry_backoff_max_ms: default_download_retry_backoff_max_ms(),
            progress_tick_ms: default_progress_tick_ms(),
        }
    }
}

impl AppSettings {
    pub fn playthrough_policy(&self) -> PlaythroughPolicy {
        PlaythroughPolicy {
            min_played_ms: self.playthrough_min_secs.saturating_mul(1000),
            min_ratio: self.playthrough_min_ratio.clamp(0.0, 1.0),
        }
    }
}

// 默认值函数（用于 serde default）
fn default_volume() -> f32 { 1.0 }
fn default_step_secs() -> f64 { 10.0 }
fn default_preferred_mime_types() -> Vec<String> {
    vec![
        "audio/ogg".to_owned(),
        "audio/mpeg".to_owned(),
        "audio/flac".to_owned(),
    ]
}
fn default_playthrough_min_secs() -> u64 { 30 }
fn default_playthrough_min_ratio() -> f64 { 0.99 }
fn default_http_timeout_secs() -> u64 { 30 }
fn default_http_connect_timeout_secs() -> u64 { 10 }
fn default_download_retries() -> u32 { 2 }
fn default_download_retry_backoff_ms() -> u64 { 250 }
fn default_download_retry_backoff_max_ms() -> u64 { 2000 }
fn default_progress_tick_ms() -> u64 { 250 }

pub fn load_settings(data_dir: &Path) -> AppSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return AppSettings::default();
    };
    match serde_json::from_slice(&bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %p.display(), err = %e, "设置文件损坏，使用默认设置");
            AppSettings::default()
        }
    }
}

pub fn save_settings(data_dir: &Path, s: &AppSettings) -> Result<(), SettingsError> {
    fs::create_dir_all(data_dir).map_err(|source| SettingsError::Save { source })?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s).map_err(|source| SettingsError::Serialize { source })?;
    fs::write(&tmp, bytes).map_err(|source| SettingsError::Save { source })?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| SettingsError::Save { source: e })?;
    }
    Ok(())
}

pub fn settings_exist(data_dir: &Path) -> bool {
    settings_path(data_dir).is_file()
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s: AppSettings = serde_json::from_str(r#"{"volume":0.5}"#).unwrap();
        assert!((s.volume - 0.5).abs() < f32::EPSILON);
        assert_eq!(s.playthrough_min_secs, 30);
        assert_eq!(s.preferred_mime_types.len(), 3);
    }

    #[test]
    fn playthrough_policy_from_settings() {
        let s = AppSettings {
            playthrough_min_secs: 45,
            playthrough_min_ratio: 1.5,
            ..AppSettings::default()
        };
        let p = s.playthrough_policy();
        assert_eq!(p.min_played_ms, 45_000);
        assert!((p.min_ratio - 1.0).abs() < f64::EPSILON);
    }
}
