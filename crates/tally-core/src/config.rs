use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding project config and the durable slot.
pub const TALLY_DIR: &str = ".tally";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bundled default: a path (relative to the project root) or an
    /// `http(s)://` URL.
    #[serde(default = "default_seed")]
    pub seed: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl WatchConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Walk up from `start` to the first directory containing `.tally/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(TALLY_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// # Errors
///
/// Fails when `.tally/config.toml` exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(TALLY_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `.tally/config.toml`, creating the directory.
///
/// # Errors
///
/// Fails when the directory or file cannot be written.
pub fn write_project_config(project_root: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let dir = project_root.join(TALLY_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// # Errors
///
/// Fails when the user config exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("tally").join(CONFIG_FILE);
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_seed() -> String {
    "intramurals_data.json".to_string()
}

const fn default_poll_interval() -> u64 {
    5
}

const fn default_refresh_interval() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().unwrap();
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.seed, "intramurals_data.json");
        assert_eq!(cfg.watch.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.watch.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn partial_project_config_fills_defaults() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join(TALLY_DIR)).unwrap();
        std::fs::write(
            root.path().join(".tally/config.toml"),
            "[watch]\npoll_interval_secs = 2\n",
        )
        .unwrap();

        let cfg = load_project_config(root.path()).unwrap();
        assert_eq!(cfg.watch.poll_interval_secs, 2);
        assert_eq!(cfg.watch.refresh_interval_secs, 30);
        assert_eq!(cfg.store.seed, "intramurals_data.json");
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join(TALLY_DIR)).unwrap();
        std::fs::write(root.path().join(".tally/config.toml"), "[watch\n").unwrap();

        let err = load_project_config(root.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn written_config_reads_back() {
        let root = TempDir::new().unwrap();
        let mut cfg = ProjectConfig::default();
        cfg.store.seed = "https://example.org/intramurals_data.json".to_string();

        let path = write_project_config(root.path(), &cfg).unwrap();
        assert!(path.ends_with(".tally/config.toml"));
        assert_eq!(load_project_config(root.path()).unwrap(), cfg);
    }

    #[test]
    fn project_root_found_from_subdirectory() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join(TALLY_DIR)).unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).as_deref(), Some(root.path()));
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").unwrap();
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
