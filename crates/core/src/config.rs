//! Environment-variable helpers shared by the client configs.
//!
//! Every config type exposes `from_env()` plus a `from_lookup()` variant
//! that takes a lookup closure, so tests can supply variables without
//! touching the process environment.

use std::str::FromStr;

/// Host the backend is served from when `MOVA_HOST` is unset.
pub const DEFAULT_HOST: &str = "localhost:8000";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Read `var` through `lookup` and parse it, falling back to `default`
/// when the variable is unset or blank.
pub fn parse_var<T, L>(lookup: &L, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Read `var` as a string, treating blank values as unset.
pub fn string_var<L>(lookup: &L, var: &str) -> Option<String>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
pub fn flag_var<L>(lookup: &L, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    match string_var(lookup, var) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

/// Build a base URL from a host and a secure flag.
///
/// `ws_scheme` selects `ws`/`wss` instead of `http`/`https`.
pub fn base_url(host: &str, secure: bool, ws_scheme: bool) -> String {
    let scheme = match (ws_scheme, secure) {
        (true, true) => "wss",
        (true, false) => "ws",
        (false, true) => "https",
        (false, false) => "http",
    };
    format!("{scheme}://{}", host.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_var_uses_default_when_unset_or_blank() {
        let env = lookup(&[("BLANK", "  ")]);
        assert_eq!(parse_var(&env, "MISSING", 7u64).unwrap(), 7);
        assert_eq!(parse_var(&env, "BLANK", 7u64).unwrap(), 7);
    }

    #[test]
    fn parse_var_reports_bad_values() {
        let env = lookup(&[("PORT", "abc")]);
        let err = parse_var(&env, "PORT", 1u16).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn flags_accept_common_spellings() {
        let env = lookup(&[("A", "YES"), ("B", "0"), ("C", "maybe")]);
        assert!(flag_var(&env, "A", false).unwrap());
        assert!(!flag_var(&env, "B", true).unwrap());
        assert!(flag_var(&env, "C", true).is_err());
        assert!(flag_var(&env, "D", true).unwrap());
    }

    #[test]
    fn base_url_picks_scheme() {
        assert_eq!(base_url("example.com/", true, true), "wss://example.com");
        assert_eq!(base_url("localhost:8000", false, false), "http://localhost:8000");
    }
}
