//! Configuration vault – reads/writes `~/.hmi/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted user configuration stored in `~/.hmi/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Robot namespace all HMI topics are composed from.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// HTTP port for the panel web UI.
    #[serde(default = "default_cockpit_port")]
    pub cockpit_port: u16,

    /// Whether to boot the simulated robot firmware alongside the panel.
    #[serde(default = "default_sim_enabled")]
    pub sim_enabled: bool,
}

fn default_namespace() -> String {
    "turtlebot4".to_string()
}
fn default_cockpit_port() -> u16 {
    8080
}
fn default_sim_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            cockpit_port: default_cockpit_port(),
            sim_enabled: default_sim_enabled(),
        }
    }
}

/// Return the path to `~/.hmi/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".hmi").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
/// Callers apply [`apply_env_overrides`] themselves so tests can exercise
/// parsing and overrides independently.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `HMI_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `HMI_NAMESPACE` | `namespace` |
/// | `HMI_COCKPIT_PORT` | `cockpit_port` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HMI_NAMESPACE")
        && !v.trim().is_empty()
    {
        cfg.namespace = v.trim().to_string();
    }
    if let Ok(v) = std::env::var("HMI_COCKPIT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.cockpit_port = port;
    }
}

/// Save the config to disk, creating `~/.hmi/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.namespace, "turtlebot4");
        assert_eq!(loaded.cockpit_port, 8080);
        assert!(loaded.sim_enabled);
    }

    #[test]
    fn config_path_points_to_hmi_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".hmi"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "namespace = \"my_robot\"\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.namespace, "my_robot");
        assert_eq!(loaded.cockpit_port, 8080);
        assert!(loaded.sim_enabled);
    }

    #[test]
    fn apply_env_overrides_namespace_valid_then_blank() {
        // SAFETY: no other test touches HMI_NAMESPACE.
        unsafe { std::env::set_var("HMI_NAMESPACE", "warehouse_bot") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.namespace, "warehouse_bot");

        unsafe { std::env::set_var("HMI_NAMESPACE", "   ") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.namespace, "turtlebot4", "blank override must be ignored");

        unsafe { std::env::remove_var("HMI_NAMESPACE") };
    }

    #[test]
    fn apply_env_overrides_port_valid_then_invalid() {
        // SAFETY: no other test touches HMI_COCKPIT_PORT.
        unsafe { std::env::set_var("HMI_COCKPIT_PORT", "8181") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.cockpit_port, 8181);

        unsafe { std::env::set_var("HMI_COCKPIT_PORT", "not-a-port") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.cockpit_port, 8080, "invalid override must be ignored");

        unsafe { std::env::remove_var("HMI_COCKPIT_PORT") };
    }
}
