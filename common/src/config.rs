use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How many worker threads the download queue's pool should use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DownloadThreads {
    Auto,
    Fixed(usize),
}

impl DownloadThreads {
    /// Resolves `Auto` against the host's logical CPU count. `Fixed` values
    /// are already validated into `[1, 50]` at load time and pass through
    /// unchanged; `auto` deliberately bypasses that clamp (see §8).
    pub fn resolve(self) -> usize {
        match self {
            DownloadThreads::Auto => num_cpus::get().max(1),
            DownloadThreads::Fixed(n) => n,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    All,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }

    /// Maps to the `tracing` level filter this maps onto; `ALL` widens to
    /// `TRACE` since `tracing` has no broader level.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::All => "trace",
        }
    }
}

/// The validated, immutable settings table the whole core reads from.
#[derive(Clone, Debug)]
pub struct Config {
    pub download_oldest_first: bool,
    pub download_threads: DownloadThreads,
    pub episode_max_count: u32,
    pub http_cache_time_seconds: u64,
    pub http_hostname: String,
    pub http_port: u16,
    pub log_max_count: u32,
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    pub music_dir: PathBuf,
    pub subscribed_to: HashSet<String>,
    pub user_agent: String,
    pub watch_interval_minutes: Option<u64>,
    pub remote_graphql_url: String,
    pub remote_web_base: String,
    pub watch_music_sets: Vec<String>,
}

/// The raw, un-validated shape of the TOML document. Every field is
/// optional so that a config file may specify only the keys it wants to
/// override; missing keys fall back to defaults during validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    download_oldest_first: Option<bool>,
    download_threads: Option<String>,
    episode_max_count: Option<u32>,
    http_cache_time_seconds: Option<u64>,
    http_hostname: Option<String>,
    http_port: Option<u16>,
    log_max_count: Option<u32>,
    log_dir: Option<String>,
    log_level: Option<String>,
    music_dir: Option<String>,
    subscribed_to: Option<String>,
    user_agent: Option<String>,
    watch_interval_minutes: Option<u64>,
    remote_graphql_url: Option<String>,
    remote_web_base: Option<String>,
    watch_music_sets: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// Aggregates every failing key so an operator can fix a config file in
    /// one pass instead of one error at a time.
    #[error("invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn default_music_dir() -> PathBuf {
    dirs::audio_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join("Music"))
}

fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("podbridge").join("logs"))
}

/// Creates `dir` (and its ancestors) if missing, failing if the path
/// exists but isn't a directory. Run at validation time so a bad
/// `music_dir` is reported alongside every other config error (§4.12)
/// rather than as a separate fatal check after logging has already
/// started.
fn ensure_music_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    if dir.is_dir() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "path exists and is not a directory",
        ))
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let mut errors = Vec::new();

        let download_threads = match self.download_threads.as_deref() {
            None => DownloadThreads::Fixed(3),
            Some(s) if s.eq_ignore_ascii_case("auto") => DownloadThreads::Auto,
            Some(s) => match s.parse::<usize>() {
                Ok(n) if (1..=50).contains(&n) => DownloadThreads::Fixed(n),
                _ => {
                    errors.push(format!(
                        "download_threads must be \"auto\" or an integer in 1..=50, got {s:?}"
                    ));
                    DownloadThreads::Fixed(3)
                }
            },
        };

        let episode_max_count = match self.episode_max_count {
            None => 25,
            Some(n) if n > 0 => n,
            Some(n) => {
                errors.push(format!("episode_max_count must be > 0, got {n}"));
                25
            }
        };

        let http_port = match self.http_port {
            None => 6499,
            Some(p) if (1024..=65535).contains(&p) => p,
            Some(p) => {
                errors.push(format!("http_port must be in 1024..=65535, got {p}"));
                6499
            }
        };

        let log_max_count = match self.log_max_count {
            None => 10,
            Some(n) if n > 0 => n,
            Some(n) => {
                errors.push(format!("log_max_count must be > 0, got {n}"));
                10
            }
        };

        let log_level = match self.log_level.as_deref() {
            None => LogLevel::Info,
            Some(s) => match LogLevel::parse(s) {
                Some(level) => level,
                None => {
                    errors.push(format!(
                        "log_level must be one of ERROR, WARNING, INFO, DEBUG, ALL, got {s:?}"
                    ));
                    LogLevel::Info
                }
            },
        };

        let music_dir = self
            .music_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(default_music_dir);

        if let Err(e) = ensure_music_dir(&music_dir) {
            errors.push(format!(
                "music_dir {music_dir:?} must exist or be creatable as a directory: {e}"
            ));
        }

        let log_dir = self
            .log_dir
            .as_deref()
            .map(expand_tilde)
            .or_else(default_log_dir);

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        let subscribed_to = self
            .subscribed_to
            .as_deref()
            .unwrap_or_default()
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect();

        let watch_music_sets = self
            .watch_music_sets
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            download_oldest_first: self.download_oldest_first.unwrap_or(false),
            download_threads,
            episode_max_count,
            http_cache_time_seconds: self.http_cache_time_seconds.unwrap_or(3600),
            http_hostname: self.http_hostname.unwrap_or_else(|| "localhost".to_string()),
            http_port,
            log_max_count,
            log_dir,
            log_level,
            music_dir,
            subscribed_to,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| "podbridge/0.1".to_string()),
            watch_interval_minutes: self.watch_interval_minutes,
            remote_graphql_url: self
                .remote_graphql_url
                .unwrap_or_else(|| "https://api.remote.example/graphql".to_string()),
            remote_web_base: self
                .remote_web_base
                .unwrap_or_else(|| "https://remote.example".to_string()),
            watch_music_sets,
        })
    }
}

/// Reads and validates a config file at `path`. Missing keys fall back to
/// documented defaults; out-of-range keys are collected into a single
/// `ConfigError::Invalid` naming every offender.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    raw.validate()
}

/// Builds a `Config` straight from defaults, used by the watcher/CLI tests
/// and as the fallback when no `--config` path is given.
pub fn default_config() -> Config {
    RawConfig::default()
        .validate()
        .expect("default configuration must always validate")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every test below points `music_dir` at a tempdir so `validate()`'s
    /// creatable-directory check never touches a real home directory.
    fn with_music_dir(tmp: &Path, extra: &str) -> String {
        format!("music_dir = {:?}\n{extra}", tmp.to_string_lossy())
    }

    #[test]
    fn defaults_validate() {
        let tmp = tempfile::tempdir().unwrap();
        let text = with_music_dir(tmp.path(), "");
        let cfg = parse(&text, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.http_port, 6499);
        assert_eq!(cfg.episode_max_count, 25);
        assert_eq!(cfg.download_threads, DownloadThreads::Fixed(3));
    }

    #[test]
    fn out_of_range_port_is_aggregated_with_other_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let text = with_music_dir(tmp.path(), "http_port = 80\nepisode_max_count = 0\n");
        let err = parse(&text, Path::new("test.toml")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("http_port"));
        assert!(message.contains("episode_max_count"));
    }

    #[test]
    fn unwritable_music_dir_is_aggregated_with_other_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let blocked_file = tmp.path().join("not_a_dir");
        std::fs::write(&blocked_file, b"x").unwrap();
        let text = format!(
            "music_dir = {:?}\nhttp_port = 80\n",
            blocked_file.to_string_lossy()
        );
        let err = parse(&text, Path::new("test.toml")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("music_dir"));
        assert!(message.contains("http_port"));
    }

    #[test]
    fn auto_threads_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let text = with_music_dir(tmp.path(), "download_threads = \"auto\"\n");
        let cfg = parse(&text, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.download_threads, DownloadThreads::Auto);
        assert!(cfg.download_threads.resolve() >= 1);
    }

    #[test]
    fn subscribed_to_splits_on_whitespace() {
        let tmp = tempfile::tempdir().unwrap();
        let text = with_music_dir(tmp.path(), "subscribed_to = \"alice bob   carol\"\n");
        let cfg = parse(&text, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.subscribed_to.len(), 3);
        assert!(cfg.subscribed_to.contains("bob"));
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = tempfile::tempdir().unwrap();
        // SAFETY: test-only, single-threaded-per-test env override; no
        // other test reads HOME concurrently with this one's assertions.
        unsafe { std::env::set_var("HOME", home.path()) };
        let text = "music_dir = \"~/Music/Podbridge\"\n";
        let cfg = parse(text, Path::new("test.toml")).unwrap();
        assert!(cfg.music_dir.is_absolute());
        assert!(cfg.music_dir.ends_with("Music/Podbridge"));
        assert!(cfg.music_dir.starts_with(home.path()));
    }
}
