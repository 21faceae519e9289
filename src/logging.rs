use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info,jukebox=debug,reqwest=warn,hyper=warn,symphonia=warn";
const LOG_FILE_PREFIX: &str = "jukebox.log";

/// 日志写线程的守卫，drop 时刷盘
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
}

/// 只写文件：`{log_dir}/jukebox.log.YYYY-MM-DD`，stdout 留给控制台
pub fn init(data_dir: &Path, cfg: LogConfig) -> LogGuard {
    let wanted = cfg.dir.unwrap_or_else(|| data_dir.join("logs"));
    let log_dir = if fs::create_dir_all(&wanted).is_ok() {
        wanted
    } else {
        let fallback = std::env::temp_dir().join("jukebox-logs");
        let _ = fs::create_dir_all(&fallback);
        fallback
    };

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(file_writer);

    let _ = tracing_subscriber::registry()
        .with(build_filter(cfg.filter.as_deref()))
        .with(file_layer)
        .try_init();
    tracing::info!(log_dir = %log_dir.display(), "tracing 已初始化");

    LogGuard(Some(guard))
}

/// 显式传入的过滤串优先，其次 RUST_LOG，最后默认值
fn build_filter(explicit: Option<&str>) -> EnvFilter {
    match explicit {
        Some(s) if !s.trim().is_empty() => EnvFilter::new(s),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}
