pub mod auth;
pub mod dashboard;
pub mod media;
pub mod rate_limit;
pub mod storage;

use std::env;

pub(crate) fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub(crate) fn parse_env<T: std::str::FromStr>(var_name: &str) -> Option<T> {
    env::var(var_name).ok().and_then(|s| s.trim().parse().ok())
}
