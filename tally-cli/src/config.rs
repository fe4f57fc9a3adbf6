use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tally_ingest::{BUILTIN_FORMAT_ID, FormatRegistry, StatementFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Format used when a command is not given `--format`.
    #[serde(default = "default_format_id")]
    pub default_format: String,

    /// Extra or overriding statement formats. A format with the built-in id
    /// replaces the built-in one.
    #[serde(default)]
    pub formats: Vec<StatementFormat>,
}

fn default_format_id() -> String {
    BUILTIN_FORMAT_ID.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: default_format_id(),
            formats: vec![StatementFormat::builtin()],
        }
    }
}

impl Config {
    pub fn registry(&self) -> FormatRegistry {
        let mut registry = FormatRegistry::with_builtin();
        for format in &self.formats {
            registry.insert(format.clone());
        }
        registry
    }

    pub fn format_id<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.default_format)
    }
}

/// `$TALLY_HOME` when set, otherwise `~/.tally`.
fn tally_home(override_dir: Option<String>, home: Option<String>) -> Result<PathBuf> {
    match (override_dir.filter(|s| !s.is_empty()), home) {
        (Some(dir), _) => Ok(PathBuf::from(dir)),
        (None, Some(home)) => Ok(PathBuf::from(home).join(".tally")),
        (None, None) => bail!("neither TALLY_HOME nor HOME is set"),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = tally_home(std::env::var("TALLY_HOME").ok(), std::env::var("HOME").ok())?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_prefers_override() {
        let home = Some("/home/sam".to_string());
        assert_eq!(
            tally_home(Some("/srv/tally".into()), home.clone()).unwrap(),
            PathBuf::from("/srv/tally")
        );
        assert_eq!(
            tally_home(Some(String::new()), home.clone()).unwrap(),
            PathBuf::from("/home/sam/.tally")
        );
        assert_eq!(tally_home(None, home).unwrap(), PathBuf::from("/home/sam/.tally"));
        assert!(tally_home(None, None).is_err());
    }

    #[test]
    fn test_default_config_survives_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.default_format, BUILTIN_FORMAT_ID);
        assert_eq!(back.formats, vec![StatementFormat::builtin()]);
    }

    #[test]
    fn test_extra_format_joins_registry() {
        let cfg: Config = toml::from_str(
            r#"
            default_format = "westpac"

            [[formats]]
            id = "westpac"
            card_suffix_width = 0

            [formats.anchors]
            transactions = ["Transactions this period"]
            "#,
        )
        .unwrap();

        let registry = cfg.registry();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, [BUILTIN_FORMAT_ID, "westpac"]);
        assert_eq!(cfg.format_id(None), "westpac");
        assert_eq!(cfg.format_id(Some(BUILTIN_FORMAT_ID)), BUILTIN_FORMAT_ID);
        assert!(registry.parser("westpac").is_ok());
    }
}
