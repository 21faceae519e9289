use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "jukebox", version, about = "个人曲库播放器（控制台）")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 曲库服务地址
    #[arg(long, env = "JUKEBOX_SERVER")]
    pub server: Option<String>,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "JUKEBOX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "JUKEBOX_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 不打开声卡，用无声后端模拟播放
    #[arg(long)]
    pub no_audio: bool,

    /// 每个状态快照输出一行 JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 交互控制台（默认）
    Console,

    /// 播放歌单全部歌曲
    PlayPlaylist {
        id: String,

        #[arg(long)]
        shuffle: bool,
    },

    /// 播放专辑全部歌曲
    PlayAlbum {
        id: String,

        #[arg(long)]
        shuffle: bool,
    },

    /// 依次把歌曲加入队列并播放第一首
    PlaySongs {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// `JUKEBOX_NO_AUDIO=1/true/yes/on`
pub fn env_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
