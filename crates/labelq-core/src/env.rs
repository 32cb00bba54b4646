//! Environment variable helpers used by the configuration layer
//!
//! Values are trimmed; an empty variable counts as unset.
//!
//! ```ignore
//! use labelq_core::env::{env_get, env_get_bool};
//!
//! let groups: usize = env_get("LQ_MAX_GROUPS", 4096);
//! let check = env_get_bool("LQ_CHECK_INVARIANTS", false);
//! ```

use std::str::FromStr;

fn raw(key: &str) -> Option<String> {
    let val = std::env::var(key).ok()?;
    let val = val.trim();
    if val.is_empty() {
        None
    } else {
        Some(val.to_string())
    }
}

/// Parse a boolean flag value
///
/// Accepts 1/true/yes/on and 0/false/no/off, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get environment variable parsed as `T`, or `default` when unset or
/// unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable parsed as `T`, if set and parsable
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    raw(key).and_then(|v| v.parse().ok())
}

/// Get environment variable as a flag
///
/// Unrecognized values fall back to `default` rather than reading as false.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    raw(key).and_then(|v| parse_bool(&v)).unwrap_or(default)
}

/// Get environment variable as a string, or `default`
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    raw(key).unwrap_or_else(|| default.to_string())
}

#[inline]
pub fn env_is_set(key: &str) -> bool {
    raw(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_defaults() {
        let val: usize = env_get("__LQ_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_bool("__LQ_TEST_UNSET__", true));
        assert_eq!(env_get_opt::<u32>("__LQ_TEST_UNSET__"), None);
        assert_eq!(env_get_str("__LQ_TEST_UNSET__", "x"), "x");
        assert!(!env_is_set("__LQ_TEST_UNSET__"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool(" yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_set_values() {
        std::env::set_var("__LQ_TEST_NUM__", " 17 ");
        assert_eq!(env_get::<u32>("__LQ_TEST_NUM__", 0), 17);
        std::env::set_var("__LQ_TEST_NUM__", "seventeen");
        assert_eq!(env_get::<u32>("__LQ_TEST_NUM__", 5), 5);
        std::env::remove_var("__LQ_TEST_NUM__");

        std::env::set_var("__LQ_TEST_FLAG__", "garbage");
        assert!(env_get_bool("__LQ_TEST_FLAG__", true));
        std::env::set_var("__LQ_TEST_FLAG__", "false");
        assert!(!env_get_bool("__LQ_TEST_FLAG__", true));
        std::env::remove_var("__LQ_TEST_FLAG__");

        std::env::set_var("__LQ_TEST_EMPTY__", "   ");
        assert!(!env_is_set("__LQ_TEST_EMPTY__"));
        std::env::remove_var("__LQ_TEST_EMPTY__");
    }
}
