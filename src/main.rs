use std::time::Duration;

use clap::Parser;
use jukebox::audio_worker::AudioBackend;
use jukebox::cli::{Cli, Command, env_flag};
use jukebox::error::AppError;
use jukebox::library::LibraryClientConfig;
use jukebox::messages::{AppCommand, Collection};
use jukebox::{console, core, logging, settings};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut cfg = LibraryClientConfig::default();
    if let Some(v) = cli.data_dir.clone() {
        cfg.data_dir = v;
    }
    if let Some(v) = cli.server.clone() {
        cfg.base_url = v;
    }

    let no_audio_env = env_flag(std::env::var("JUKEBOX_NO_AUDIO").ok().as_deref());
    let audio_backend = if cli.no_audio || no_audio_env {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };

    let _log_guard = logging::init(
        &cfg.data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(
        data_dir = %cfg.data_dir.display(),
        server = %cfg.base_url,
        ?audio_backend,
        "jukebox 启动"
    );

    std::fs::create_dir_all(&cfg.data_dir)?;
    let app_settings = settings::load_settings(&cfg.data_dir);
    if !settings::settings_exist(&cfg.data_dir) {
        // 首次启动写出默认设置，方便手动修改
        if let Err(e) = settings::save_settings(&cfg.data_dir, &app_settings) {
            tracing::warn!(err = %e, "写入默认设置失败");
        }
    }
    cfg.timeout = Duration::from_secs(app_settings.http_timeout_secs.max(1));
    cfg.connect_timeout = Duration::from_secs(app_settings.http_connect_timeout_secs.max(1));

    let (tx, rx) = core::spawn_app_actor(cfg, app_settings, audio_backend)?;

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => {}
        Command::PlayPlaylist { id, shuffle } => {
            let collection = Collection::Playlist(id);
            let _ = tx.send(AppCommand::PlayCollection { collection, shuffle }).await;
        }
        Command::PlayAlbum { id, shuffle } => {
            let collection = Collection::Album(id);
            let _ = tx.send(AppCommand::PlayCollection { collection, shuffle }).await;
        }
        Command::PlaySongs { ids } => {
            for song_id in ids {
                let _ = tx.send(AppCommand::QueueSong { song_id, next: false }).await;
            }
        }
    }

    console::run_console(tx, rx, cli.json).await?;
    tracing::info!("jukebox 退出");
    Ok(())
}
