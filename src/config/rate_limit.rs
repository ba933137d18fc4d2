use super::parse_bool_env;
use std::env;
use std::str::FromStr;

/// Route groups that share a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitGroup {
    /// Login, logout and session lookup.
    Auth,
    /// Public report submission.
    Submit,
    /// Dashboard endpoints.
    Admin,
}

impl LimitGroup {
    const ALL: [LimitGroup; 3] = [Self::Auth, Self::Submit, Self::Admin];

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for LimitGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "submit" | "public" | "reports" => Ok(Self::Submit),
            "admin" => Ok(Self::Admin),
            other => Err(format!(
                "unknown group '{}', expected auth/submit/admin",
                other
            )),
        }
    }
}

/// Governor settings: one token is replenished every `per_second`
/// seconds, up to `burst_size` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl FromStr for RateLimitRule {
    type Err = String;

    /// Parses `per:burst`, both strictly positive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (per, burst) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw.trim()))?;

        let per_second = per
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("per_second must be a positive integer, got '{}'", per.trim()))?;
        let burst_size = burst
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("burst_size must be a positive integer, got '{}'", burst.trim()))?;

        Ok(Self {
            per_second,
            burst_size,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    rules: [RateLimitRule; 3],
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let rule = |per_second, burst_size| RateLimitRule {
            per_second,
            burst_size,
        };
        Self {
            enabled: true,
            // Indexed by `LimitGroup`.
            rules: [rule(1, 5), rule(2, 10), rule(1, 60)],
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_ENABLED` toggles limiting. `RATE_LIMIT_CONFIG` is either a
    /// single `per:burst` for every group or `group=per:burst,...`. A bad
    /// value is logged and the defaults stay in place.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                cfg.rules = Self::default().rules;
            }
        }

        cfg
    }

    pub fn rule(&self, group: LimitGroup) -> RateLimitRule {
        self.rules[group.index()]
    }

    fn apply(&mut self, raw: &str) -> Result<(), String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("empty value".to_string());
        }

        if !raw.contains('=') {
            let rule: RateLimitRule = raw.parse()?;
            for group in LimitGroup::ALL {
                self.rules[group.index()] = rule;
            }
            return Ok(());
        }

        for item in raw.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (group, rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected group=per:burst", item))?;
            let group: LimitGroup = group.parse()?;
            self.rules[group.index()] = rule.parse()?;
        }
        Ok(())
    }
}
