use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LibraryClientConfig {
    /// 曲库服务地址，例如 `http://localhost:3000`
    pub base_url: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for LibraryClientConfig {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("dev", "jukebox", "jukebox")
            .map(|p| p.data_local_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("jukebox"));
        Self {
            base_url: "http://localhost:3000".to_owned(),
            data_dir,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
