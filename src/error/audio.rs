//! 音频播放相关错误

use super::DownloadError;

/// 音频播放错误类型
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// 曲目没有任何播放源
    #[error("没有可用的播放源({track_id})")]
    NoSource { track_id: String },

    /// 打开音频文件失败
    #[error("打开音频文件失败({title}): {source}")]
    OpenFile {
        title: String,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({title}): {source}")]
    Decode {
        title: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 下载错误
    #[error("下载失败: {0}")]
    Download(#[from] DownloadError),

    /// 音频输出流创建失败
    #[error("创建音频输出流失败: {0}")]
    OutputStream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::OutputStream("无法初始化音频设备".to_string());
        assert_eq!(err.to_string(), "创建音频输出流失败: 无法初始化音频设备");
    }

    #[test]
    fn test_open_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件未找到");
        let err = AudioError::OpenFile {
            title: "测试歌曲".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("测试歌曲"));
        assert!(err.to_string().contains("文件未找到"));
    }
}
