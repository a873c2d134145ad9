//! `${name}` placeholder rendering for scenario requests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::common::config::Credentials;
use crate::common::{Error, Result};

/// Last value handed out by [`next_timestamp`]
static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the epoch, strictly increasing within the process.
///
/// Two scenarios started in the same millisecond still get distinct
/// values, so generated names like `tempUser_${timestamp}` never collide.
pub fn next_timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let bump = |last: u64| now.max(last + 1);
    match LAST_TIMESTAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last))) {
        Ok(previous) | Err(previous) => bump(previous),
    }
}

/// Variables visible to one scenario
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    /// Built-ins: `timestamp`, `username`, `password`
    pub fn builtin(credentials: &Credentials) -> Self {
        let mut values = BTreeMap::new();
        values.insert("timestamp".to_string(), next_timestamp().to_string());
        values.insert("username".to_string(), credentials.username.clone());
        values.insert("password".to_string(), credentials.password.clone());
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Add scenario variables, each rendered against what is already defined.
    ///
    /// Scenario variables cannot reference each other or shadow built-ins.
    pub fn extend_rendered(&mut self, vars: &BTreeMap<String, String>) -> Result<()> {
        let mut rendered = Vec::with_capacity(vars.len());
        for (name, template) in vars {
            if self.values.contains_key(name) {
                return Err(Error::Template(format!(
                    "Variable '{}' shadows a built-in variable",
                    name
                )));
            }
            rendered.push((name.clone(), self.render(template)?));
        }
        self.values.extend(rendered);
        Ok(())
    }

    /// Replace every `${name}` in `input`
    pub fn render(&self, input: &str) -> Result<String> {
        let mut output = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                Error::Template(format!("Unterminated placeholder in '{}'", input))
            })?;
            let name = after[..end].trim();
            let value = self.get(name).ok_or_else(|| {
                Error::Template(format!("Unknown variable '{}' in '{}'", name, input))
            })?;
            output.push_str(value);
            rest = &after[end + 1..];
        }
        output.push_str(rest);

        Ok(output)
    }

    /// Render every string leaf of a JSON value. Keys are left alone.
    pub fn render_value(&self, value: &Value) -> Result<Value> {
        Ok(match value {
            Value::String(s) => Value::String(self.render(s)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| self.render_value(v))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| -> Result<(String, Value)> { Ok((k.clone(), self.render_value(v)?)) })
                    .collect::<Result<_>>()?,
            ),
            other => other.clone(),
        })
    }

    /// Render each value of a string map
    pub fn render_map(&self, map: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
        map.iter()
            .map(|(k, v)| -> Result<(String, String)> { Ok((k.clone(), self.render(v)?)) })
            .collect()
    }
}
