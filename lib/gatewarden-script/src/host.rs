//! Host functions injected into every script run (spec §4.E).

use std::sync::{Arc, Mutex};

use md5::Md5;
use rhai::{Dynamic, Engine};
use sha2::{Digest, Sha256};
use tracing::{error, info};

/// Values passed to `commit(...)` during this run, in call order.
pub type CommitLog = Arc<Mutex<Vec<serde_json::Value>>>;

/// Registers `say`, `console.log`/`console.error`, `md5`, `sha256`,
/// `commit` and `fetch` on a freshly-created engine for one script run, and
/// seeds `scope` with the `console` constant.
pub fn register_host_functions(
    engine: &mut Engine,
    scope: &mut rhai::Scope,
    context_id: &str,
    commits: CommitLog,
) {
    let say_context = context_id.to_string();
    engine.register_fn("say", move |message: &str| {
        info!(context_id = %say_context, "{message}");
    });

    #[derive(Clone)]
    struct Console {
        context_id: String,
    }
    engine.register_type_with_name::<Console>("Console");
    engine.register_fn("log", |console: &mut Console, message: Dynamic| {
        info!(context_id = %console.context_id, "console.log: {message}");
    });
    engine.register_fn("error", |console: &mut Console, message: Dynamic| {
        error!(context_id = %console.context_id, "console.error: {message}");
    });

    scope.push_constant(
        "console",
        Console {
            context_id: context_id.to_string(),
        },
    );

    engine.register_fn("md5", |input: Dynamic| -> Dynamic {
        if input.is_unit() {
            return Dynamic::UNIT;
        }
        let text = input.to_string();
        let digest = Md5::digest(text.as_bytes());
        Dynamic::from(hex::encode(digest))
    });

    engine.register_fn("sha256", |input: Dynamic| -> Dynamic {
        if input.is_unit() {
            return Dynamic::UNIT;
        }
        let text = input.to_string();
        let digest = Sha256::digest(text.as_bytes());
        Dynamic::from(hex::encode(digest))
    });

    engine.register_fn("commit", move |value: rhai::Map| {
        if let Ok(json) = serde_json::to_value(dynamic_map_to_json(&value)) {
            commits.lock().expect("commit log poisoned").push(json);
        }
    });

    engine.register_fn("fetch", crate::fetch::fetch_blocking);
}

/// Converts a `rhai::Map` into a `serde_json::Map`, recursing through
/// nested maps/arrays. `commit`'s payloads are small (subject/profile
/// shaped) so this is not optimized for large documents.
pub(crate) fn dynamic_map_to_json(map: &rhai::Map) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (key, value) in map.iter() {
        out.insert(key.to_string(), dynamic_to_json(value));
    }
    serde_json::Value::Object(out)
}

pub(crate) fn dynamic_to_json(value: &Dynamic) -> serde_json::Value {
    if value.is_unit() {
        serde_json::Value::Null
    } else if let Some(b) = value.clone().try_cast::<bool>() {
        serde_json::Value::Bool(b)
    } else if let Some(i) = value.clone().try_cast::<i64>() {
        serde_json::Value::from(i)
    } else if let Some(f) = value.clone().try_cast::<f64>() {
        serde_json::json!(f)
    } else if let Some(s) = value.clone().try_cast::<rhai::ImmutableString>() {
        serde_json::Value::String(s.to_string())
    } else if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
        serde_json::Value::Array(arr.iter().map(dynamic_to_json).collect())
    } else if let Some(map) = value.clone().try_cast::<rhai::Map>() {
        dynamic_map_to_json(&map)
    } else {
        serde_json::Value::String(value.to_string())
    }
}

/// Finds the first committed value carrying a `subject` field (spec §4.E:
/// `Subject.decode(committed)`).
pub(crate) fn decode_subject(commits: &[serde_json::Value]) -> Option<String> {
    commits.iter().find_map(|value| {
        value
            .get("subject")
            .and_then(|s| s.as_str())
            .map(ToString::to_string)
    })
}

/// Converts a `serde_json::Value` into a `rhai::Map`, the inverse of
/// [`dynamic_map_to_json`]. Used to hand the stored user profile back into
/// `user_validation_provider`.
pub(crate) fn json_value_to_map(value: &serde_json::Value) -> rhai::Map {
    match value {
        serde_json::Value::Object(object) => {
            let mut map = rhai::Map::new();
            for (key, val) in object.iter() {
                map.insert(key.into(), json_to_dynamic(val));
            }
            map
        }
        _ => rhai::Map::new(),
    }
}

pub(crate) fn json_to_dynamic(value: &serde_json::Value) -> Dynamic {
    match value {
        serde_json::Value::Null => Dynamic::UNIT,
        serde_json::Value::Bool(b) => Dynamic::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else {
                Dynamic::from(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Dynamic::from(s.clone()),
        serde_json::Value::Array(arr) => {
            Dynamic::from(arr.iter().map(json_to_dynamic).collect::<rhai::Array>())
        }
        serde_json::Value::Object(_) => Dynamic::from(json_value_to_map(value)),
    }
}
