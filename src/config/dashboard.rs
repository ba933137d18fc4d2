use super::parse_env;
use std::env;
use std::time::Duration;

const DEFAULT_POLL_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Reload on a fixed interval.
    Poll,
    /// Reload when the report collection is written.
    Notify,
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardConfig {
    pub refresh: RefreshMode,
    pub poll_interval: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshMode::Poll,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECONDS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(raw) = env::var("DASHBOARD_REFRESH") {
            match parse_refresh_mode(&raw) {
                Some(mode) => cfg.refresh = mode,
                None => tracing::warn!("Invalid DASHBOARD_REFRESH '{}', using poll", raw),
            }
        }

        if let Some(secs) = parse_env::<u64>("DASHBOARD_POLL_SECONDS").filter(|s| *s > 0) {
            cfg.poll_interval = Duration::from_secs(secs);
        }

        cfg
    }
}

fn parse_refresh_mode(raw: &str) -> Option<RefreshMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "poll" | "polling" => Some(RefreshMode::Poll),
        "notify" | "push" | "events" => Some(RefreshMode::Notify),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_five_second_polling() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.refresh, RefreshMode::Poll);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn refresh_mode_aliases() {
        assert_eq!(parse_refresh_mode("Notify"), Some(RefreshMode::Notify));
        assert_eq!(parse_refresh_mode(" poll "), Some(RefreshMode::Poll));
        assert_eq!(parse_refresh_mode("websocket"), None);
    }
}
