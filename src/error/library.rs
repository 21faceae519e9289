//! 曲库 API 相关错误

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// 网络请求错误
    #[error("reqwest 错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 非 2xx 响应
    #[error("HTTP 状态码 {status}: {url}")]
    Status { status: StatusCode, url: String },

    /// base url 或文件地址无法解析
    #[error("URL 无效: {0}")]
    BadUrl(String),
}

impl LibraryError {
    /// 判断是否是可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            LibraryError::Http(_) => true,
            LibraryError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            LibraryError::BadUrl(_) => false,
        }
    }
}
