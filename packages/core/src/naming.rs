//! Naming translation between the internal `snake_case` convention and the
//! `lowerCamelCase` wire convention.
//!
//! Both directions are pure string functions. Results are memoized in a
//! process-wide cache because the same handful of field names are translated
//! on every request.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use convert_case::{Case, Casing};

static TO_WIRE: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static TO_INTERNAL: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Convert an internal `snake_case` name to its `lowerCamelCase` wire form.
///
/// ```rust
/// use recallwire::naming::to_wire_name;
///
/// assert_eq!(to_wire_name("published_at"), "publishedAt");
/// assert_eq!(to_wire_name("title"), "title");
/// ```
///
/// Leading underscores are dropped, so `_id` becomes `id`.
pub fn to_wire_name(internal: &str) -> String {
    memoized(&TO_WIRE, internal, camelize)
}

/// Convert a `lowerCamelCase` wire name back to `snake_case`.
pub fn to_internal_name(wire: &str) -> String {
    memoized(&TO_INTERNAL, wire, underscore)
}

/// Naive English pluralization, enough for entity type names.
///
/// `recall` → `recalls`, `company` → `companies`, `match` → `matches`.
pub fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with('y')
        && !matches!(
            lower.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        )
        && lower.len() > 1
    {
        return format!("{}ies", &name[..name.len() - 1]);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{name}es");
    }
    format!("{name}s")
}

// --- helpers -----------------------------------------------------------------

fn memoized(
    cache: &RwLock<HashMap<String, String>>,
    key: &str,
    f: fn(&str) -> String,
) -> String {
    if let Ok(map) = cache.read() {
        if let Some(hit) = map.get(key) {
            return hit.clone();
        }
    }
    let value = f(key);
    // Poisoned cache: skip the memo.
    if let Ok(mut map) = cache.write() {
        map.insert(key.to_string(), value.clone());
    }
    value
}

fn camelize(s: &str) -> String {
    s.trim_start_matches('_')
        .from_case(Case::Snake)
        .to_case(Case::Camel)
}

fn underscore(s: &str) -> String {
    s.from_case(Case::Camel).to_case(Case::Snake)
}

// --- tests -------------------------------------------------------------------
