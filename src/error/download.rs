//! 下载相关错误

use reqwest::StatusCode;

/// 下载错误类型
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 状态码错误
    #[error("HTTP 状态码 {status}: {url}")]
    StatusCode { status: StatusCode, url: String },

    /// 创建文件失败
    #[error("创建临时文件失败: {source}")]
    CreateFile {
        #[source]
        source: std::io::Error,
    },

    /// 写入文件失败
    #[error("写入文件失败({title}): {source}")]
    Write {
        title: String,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Http(_) | DownloadError::Write { .. } => true,
            DownloadError::StatusCode { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            DownloadError::CreateFile { .. } => false,
        }
    }
}
