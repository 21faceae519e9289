use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_ms: u64,
    pub backoff_max_ms: u64,
}

/// 下载到指定路径；超时/限流/5xx 等可重试错误按指数退避重试
pub async fn download_to_path(
    http: &reqwest::Client,
    out_path: &Path,
    url: &str,
    title: &str,
    retry: RetryPolicy,
) -> Result<(), DownloadError> {
    let mut attempt = 0;
    loop {
        match download_once(http, out_path, url, title).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retry.retries && e.is_retryable() => {
                tracing::debug!(attempt, url, err = %e, "下载失败，稍后重试");
                sleep_backoff(attempt, retry.backoff_ms, retry.backoff_max_ms).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn download_once(
    http: &reqwest::Client,
    out_path: &Path,
    url: &str,
    title: &str,
) -> Result<(), DownloadError> {
    // 每次尝试都从空文件开始
    let _ = tokio::fs::remove_file(out_path).await;

    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::StatusCode {
            status,
            url: url.to_owned(),
        });
    }

    let mut file = tokio::fs::File::create(out_path)
        .await
        .map_err(|source| DownloadError::CreateFile { source })?;

    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        file.write_all(&bytes)
            .await
            .map_err(|source| DownloadError::Write {
                title: title.to_owned(),
                source,
            })?;
    }
    file.flush().await.map_err(|source| DownloadError::Write {
        title: title.to_owned(),
        source,
    })?;
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

async fn sleep_backoff(attempt: u32, base_ms: u64, max_ms: u64) {
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.min(6)));
    let mut ms = exp.min(max_ms);

    // Tiny jitter (0..=250ms) without pulling in RNG deps.
    let jitter = now_ms() % 251;
    ms = ms.saturating_add(jitter).min(max_ms);

    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
