use serde_json::{Map, Value};

use super::defaults::AppConfig;
use crate::core::errors::ApiError;

const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "lmstudio"];

/// Structural checks on the merged YAML, run before deserializing so that
/// errors name the offending key.
pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_required_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_required_string_field(llm, "llm.provider", "provider")?;
        validate_required_string_field(llm, "llm.base_url", "base_url")?;
        validate_required_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_required_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;

        if let Some(provider) = llm.get("provider").and_then(|v| v.as_str()) {
            if !KNOWN_PROVIDERS.contains(&provider) {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'llm.provider': expected one of {}",
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 100)?;
        validate_u64_field(rag, "rag.embed_batch_size", "embed_batch_size", 1, 4096)?;
    }

    if let Some(chat) = expect_optional_object(root, "chat")? {
        validate_u64_field(chat, "chat.context_exchanges", "context_exchanges", 0, 100)?;
    }

    if let Some(auth) = expect_optional_object(root, "auth")? {
        validate_u64_field(
            auth,
            "auth.session_ttl_minutes",
            "session_ttl_minutes",
            1,
            525_600,
        )?;
    }

    if let Some(filter) = expect_optional_object(root, "topic_filter")? {
        for key in [
            "fast_greetings",
            "help_triggers",
            "goodbye_triggers",
            "fast_non_pet_keywords",
            "greetings",
            "pet_keywords",
            "non_pet_keywords",
            "polite_phrases",
        ] {
            validate_string_array_field(filter, &format!("topic_filter.{}", key), key)?;
        }
    }

    Ok(())
}

/// Cross-field rules that only make sense on the typed config.
pub fn validate_typed(config: &AppConfig) -> Result<(), ApiError> {
    if config.rag.chunk_overlap >= config.rag.chunk_size {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at 'rag.chunk_overlap': must be smaller than rag.chunk_size ({})",
            config.rag.chunk_size
        )));
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
