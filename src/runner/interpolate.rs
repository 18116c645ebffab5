//! Variable interpolation for strings
//!
//! Placeholders use the `${VAR}` syntax. Substitution is a single pass:
//! text inserted for a placeholder is never scanned again, and a placeholder
//! that cannot be resolved is an error rather than being left in place.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Interpolate variables in a string
///
/// Names are looked up in `vars` first, then in the process environment.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    interpolate_with(s, |name| {
        vars.get(name).cloned().or_else(|| env::var(name).ok())
    })
}

/// Interpolate using an arbitrary lookup function
pub fn interpolate_with<F>(s: &str, mut lookup: F) -> InterpolationResult<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut missing: Option<String> = None;

    let result = PLACEHOLDER.replace_all(s, |caps: &Captures| {
        let name = caps[1].trim();
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(InterpolationError::UndefinedVariable(name)),
        None => Ok(result.into_owned()),
    }
}

/// Interpolate both keys and values of a map
pub fn interpolate_map(
    map: &HashMap<String, String>,
    vars: &HashMap<String, String>,
) -> InterpolationResult<Vec<(String, String)>> {
    let mut result = Vec::with_capacity(map.len());

    for (key, value) in map {
        result.push((interpolate(key, vars)?, interpolate(value, vars)?));
    }

    Ok(result)
}

/// Whether a string contains at least one `${...}` placeholder
pub fn has_placeholders(s: &str) -> bool {
    PLACEHOLDER.is_match(s)
}

/// Resolve a task's variables into the scope used by its commands
///
/// Precedence, highest first: `overrides`, the task's own `vars`, then
/// `base` (globals and captured outputs), then the process environment.
/// Each task var is substituted once against the other raw task vars and
/// the lower layers; a var that mentions its own name sees the lower layers.
pub fn resolve_task_vars(
    task_vars: &HashMap<String, String>,
    base: &HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> InterpolationResult<HashMap<String, String>> {
    let mut scope = base.clone();

    for (key, raw) in task_vars {
        if overrides.contains_key(key) {
            continue;
        }
        let value = interpolate_with(raw, |name| {
            overrides
                .get(name)
                .or_else(|| task_vars.get(name).filter(|_| name != key.as_str()))
                .or_else(|| base.get(name))
                .cloned()
                .or_else(|| env::var(name).ok())
        })?;
        scope.insert(key.clone(), value);
    }

    scope.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(scope)
}
