//! Environment variable helpers
//!
//! Small typed wrappers over `std::env::var` used by the configuration
//! layer. Parse failures fall back to the provided default rather than
//! erroring, so a malformed variable never prevents startup.

use std::str::FromStr;

/// Read an environment variable and parse it, falling back to `default`
/// when the variable is unset or does not parse.
///
/// # Example
///
/// ```ignore
/// let stack = env_get("XPT_STACK_SIZE", 64 * 1024usize);
/// ```
pub fn env_get<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a boolean environment variable.
///
/// Accepts `1`, `true`, `yes`, `on` (case-insensitive) as true and
/// `0`, `false`, `no`, `off` as false. Anything else keeps the default.
pub fn env_get_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(val) => match val.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Read a string environment variable with a default.
pub fn env_get_str(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Whether an environment variable is set at all, regardless of value.
pub fn env_is_set(name: &str) -> bool {
    std::env::var(name).is_ok()
}
