use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::WarbleConfig;

/// Config file name, looked up in `./` then the user config dir.
const CONFIG_FILENAME: &str = "warble.toml";

/// Environment variable naming an explicit config file path.
const CONFIG_PATH_VAR: &str = "WARBLE_CONFIG";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<WarbleConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let mut cfg: WarbleConfig =
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    normalize(&mut cfg)?;
    Ok(cfg)
}

/// Discover and load config, falling back to built-in defaults.
///
/// Search order:
/// 1. `explicit` (a `--config` flag), which must load or the error propagates
/// 2. `$WARBLE_CONFIG`
/// 3. `./warble.toml`
/// 4. `<user config dir>/warble/warble.toml`
///
/// After loading, `WARBLE_*` environment overrides are applied.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<WarbleConfig> {
    let mut cfg = if let Some(path) = explicit {
        load_config(path)?
    } else if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                WarbleConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        WarbleConfig::default()
    };

    apply_env_overrides(&mut cfg);
    normalize(&mut cfg)?;
    Ok(cfg)
}

/// Apply `WARBLE_*` environment overrides on top of the loaded config.
pub fn apply_env_overrides(cfg: &mut WarbleConfig) {
    apply_env_overrides_with(cfg, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(cfg: &mut WarbleConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(bind) = lookup("WARBLE_BIND") {
        cfg.server.bind = bind;
    }
    if let Some(port) = lookup("WARBLE_PORT") {
        match port.parse() {
            Ok(port) => cfg.server.port = port,
            Err(_) => warn!(value = %port, "ignoring non-numeric WARBLE_PORT"),
        }
    }
    if let Some(headless) = lookup("WARBLE_HEADLESS") {
        match headless.parse() {
            Ok(headless) => cfg.browser.headless = headless,
            Err(_) => warn!(value = %headless, "ignoring non-boolean WARBLE_HEADLESS"),
        }
    }
    if let Some(base_url) = lookup("WARBLE_BASE_URL") {
        cfg.browser.base_url = base_url;
    }
    if let Some(key) = lookup("WARBLE_DEV_KEY") {
        cfg.auth.dev_key = Some(key);
    }
}

/// Validate the base URL and strip its trailing slashes.
fn normalize(cfg: &mut WarbleConfig) -> anyhow::Result<()> {
    let trimmed = cfg.browser.base_url.trim_end_matches('/');
    url::Url::parse(trimmed)
        .map_err(|e| anyhow::anyhow!("invalid browser.base_url {:?}: {e}", cfg.browser.base_url))?;
    cfg.browser.base_url = trimmed.to_string();
    Ok(())
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }

    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dir) = config_dir() {
        let p = dir.join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/warble/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "warble").map(|d| d.config_dir().to_path_buf())
}

/// Replace `${ENV_VAR}` placeholders in the raw config text.
///
/// Unresolvable or malformed placeholders are left as-is.
fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                result.push_str("${");
                rest = after;
            },
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn loads_a_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 4444\n\n[browser]\nbase_url = \"https://example.com/\"\n"
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.server.port, 4444);
        // Trailing slash is stripped during normalization.
        assert_eq!(cfg.browser.base_url, "https://example.com");
    }

    #[test]
    fn rejects_an_invalid_base_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[browser]\nbase_url = \"not a url\"\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn env_overrides_replace_loaded_values() {
        let mut cfg = WarbleConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            "WARBLE_PORT" => Some("9000".into()),
            "WARBLE_HEADLESS" => Some("false".into()),
            "WARBLE_DEV_KEY" => Some("dev-key".into()),
            _ => None,
        });
        assert_eq!(cfg.server.port, 9000);
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.auth.dev_key.as_deref(), Some("dev-key"));
    }

    #[test]
    fn bad_env_overrides_are_ignored() {
        let mut cfg = WarbleConfig::default();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == "WARBLE_PORT").then(|| "not-a-port".into())
        });
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn substitutes_known_placeholders_only() {
        let lookup = |name: &str| (name == "WARBLE_TEST_VAR").then(|| "hello".to_string());
        assert_eq!(
            substitute_env_with("key = \"${WARBLE_TEST_VAR}\"", lookup),
            "key = \"hello\""
        );
        assert_eq!(
            substitute_env_with("${WARBLE_MISSING_XYZ}", |_| None),
            "${WARBLE_MISSING_XYZ}"
        );
        assert_eq!(substitute_env_with("plain ${ broken", |_| None), "plain ${ broken");
    }
}
