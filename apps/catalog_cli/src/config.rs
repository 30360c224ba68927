use std::{collections::HashMap, fs, path::Path};

pub const SETTINGS_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub storage_url: String,
    pub log: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:9000".into(),
            storage_url: "sqlite://./data/catalog.db".into(),
            log: "info".into(),
        }
    }
}

/// Command line values that win over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub storage_url: Option<String>,
    pub log: Option<String>,
}

pub fn load_settings(overrides: Overrides) -> Settings {
    let mut settings = load_settings_from(Path::new(SETTINGS_FILE));
    settings.apply_overrides(overrides);
    settings.storage_url = normalize_storage_url(&settings.storage_url);
    settings
}

/// Defaults, then the settings file when it exists, then the environment.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings.merge_file(&raw);
    }

    settings.merge_env(|key| std::env::var(key).ok());
    settings
}

impl Settings {
    /// Flat `key = "value"` table; anything else is ignored.
    pub fn merge_file(&mut self, raw: &str) {
        let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
            return;
        };
        if let Some(v) = file_cfg.get("api_url") {
            self.api_url = v.clone();
        }
        if let Some(v) = file_cfg.get("storage_url") {
            self.storage_url = v.clone();
        }
        if let Some(v) = file_cfg.get("log") {
            self.log = v.clone();
        }
    }

    pub fn merge_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CATALOG_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = var("APP__API_URL") {
            self.api_url = v;
        }

        if let Some(v) = var("CATALOG_STORAGE_URL") {
            self.storage_url = v;
        }
        if let Some(v) = var("APP__STORAGE_URL") {
            self.storage_url = v;
        }

        if let Some(v) = var("CATALOG_LOG") {
            self.log = v;
        }
        if let Some(v) = var("APP__LOG") {
            self.log = v;
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.api_url {
            self.api_url = v;
        }
        if let Some(v) = overrides.storage_url {
            self.storage_url = v;
        }
        if let Some(v) = overrides.log {
            self.log = v;
        }
    }
}

pub fn normalize_storage_url(raw_storage_url: &str) -> String {
    let raw_storage_url = raw_storage_url.trim();

    if raw_storage_url.is_empty() {
        return Settings::default().storage_url;
    }

    if raw_storage_url.starts_with("sqlite::memory:") || raw_storage_url.contains("://") {
        return raw_storage_url.to_string();
    }

    let path = raw_storage_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_storage_url)
        .replace('\\', "/");
    format!("sqlite://{path}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
