use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::AppConfig;
use super::paths::AppPaths;
use super::validation::{validate_config, validate_typed};
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("PAWMEDBOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Loads `config.yml` over the built-in defaults, then applies the
    /// `HOST` / `PORT` environment overrides.
    pub fn load_config(&self) -> Result<AppConfig, ApiError> {
        let overrides = load_yaml_file(&self.config_path());
        let mut config = resolve_config(&overrides)?;

        if let Ok(host) = env::var("HOST") {
            if !host.trim().is_empty() {
                config.server.host = host;
            }
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            config.server.port = port;
        }

        Ok(config)
    }

    /// Directory scanned for veterinary documents.
    pub fn documents_dir(&self, config: &AppConfig) -> PathBuf {
        match config.rag.documents_dir.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let candidate = PathBuf::from(raw);
                if candidate.is_absolute() {
                    candidate
                } else {
                    self.paths.project_root.join(candidate)
                }
            }
            _ => self.paths.documents_dir.clone(),
        }
    }
}

/// Deep-merges `overrides` over the defaults and produces a validated config.
pub fn resolve_config(overrides: &Value) -> Result<AppConfig, ApiError> {
    let defaults = serde_json::to_value(AppConfig::default()).map_err(ApiError::internal)?;
    let merged = deep_merge(&defaults, overrides);
    validate_config(&merged)?;

    let config: AppConfig = serde_json::from_value(merged)
        .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))?;
    validate_typed(&config)?;
    Ok(config)
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}
