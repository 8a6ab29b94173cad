use std::path::PathBuf;

use serde::Deserialize;

/// Settings from `<config dir>/model-pricing/config.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Preferred display currency.
    pub currency: Option<String>,
    pub show_validation: Option<bool>,
    /// Rate table override.
    pub rates: Option<PathBuf>,
    /// Reference price table override.
    pub reference: Option<PathBuf>,
}

pub fn config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("model-pricing").join("config.toml"))
}

pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(data) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    parse_config(&data).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
        Config::default()
    })
}

pub fn parse_config(data: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let c = parse_config(
            r#"
currency = "EUR"
show_validation = false
rates = "/tmp/rates.toml"
"#,
        )
        .unwrap();
        assert_eq!(c.currency.as_deref(), Some("EUR"));
        assert_eq!(c.show_validation, Some(false));
        assert_eq!(c.rates, Some(PathBuf::from("/tmp/rates.toml")));
        assert!(c.reference.is_none());
    }

    #[test]
    fn empty_config_is_default() {
        let c = parse_config("").unwrap();
        assert!(c.currency.is_none());
        assert!(c.show_validation.is_none());
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(parse_config("show_validation = \"yes\"").is_err());
    }
}
