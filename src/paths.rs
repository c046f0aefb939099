use std::path::PathBuf;
use std::sync::OnceLock;

static TASKRANK_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Returns the taskrank home directory (`~/.taskrank/`).
/// Supports `$TASKRANK_HOME` env override. Cached via `OnceLock`.
pub fn taskrank_home() -> &'static PathBuf {
    TASKRANK_HOME.get_or_init(|| {
        if let Ok(val) = std::env::var("TASKRANK_HOME") {
            let p = PathBuf::from(val);
            if !p.as_os_str().is_empty() {
                return p;
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskrank")
    })
}

/// `~/.taskrank/config/`
pub fn config_dir() -> PathBuf {
    taskrank_home().join("config")
}

/// `~/.taskrank/logs/`
pub fn logs_dir() -> PathBuf {
    taskrank_home().join("logs")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
