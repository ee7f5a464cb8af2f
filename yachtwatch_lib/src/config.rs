//! Tunable heuristic constants, overridable through `YACHTWATCH_*`
//! environment variables.
//!
//! The length-ratio match threshold and the per-source request delays are
//! heuristics without a documented derivation; they are kept configurable
//! rather than hard-coded so operators can tighten or relax them without a
//! rebuild.

use std::time::Duration;

/// Default length-ratio bound for fuzzy registry matching: two same-named
/// records with confident lengths are the same vessel only when
/// `min/max > 0.6`.
pub const DEFAULT_LENGTH_RATIO_THRESHOLD: f64 = 0.6;

/// Registry length-ratio threshold, overridable via
/// `YACHTWATCH_LENGTH_RATIO`.
pub fn length_ratio_threshold() -> f64 {
    env_f64("YACHTWATCH_LENGTH_RATIO", DEFAULT_LENGTH_RATIO_THRESHOLD)
}

/// Pacing and batching knobs for the enrichment pipeline.
///
/// The detail-page scrape is the most expensive and most blockable source,
/// so it carries the longest delay. Delays apply unconditionally between
/// requests of the same class, even when a source resolves from in-process
/// state, to respect third-party request budgets.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Delay after each detail-page request.
    pub detail_delay: Duration,
    /// Delay after each encyclopedia request.
    pub wiki_delay: Duration,
    /// Delay between the owner-page search and its extract fetch.
    pub owner_delay: Duration,
    /// Snapshot write-back frequency, in processed vessels.
    pub checkpoint_every: usize,
    /// Minimum effective length for encyclopedia lookups, in meters.
    pub wiki_min_length: u32,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            detail_delay: Duration::from_millis(3500),
            wiki_delay: Duration::from_millis(1000),
            owner_delay: Duration::from_millis(500),
            checkpoint_every: 5,
            wiki_min_length: 30,
        }
    }
}

impl EnrichConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detail_delay: Duration::from_millis(env_u64(
                "YACHTWATCH_DETAIL_DELAY_MS",
                defaults.detail_delay.as_millis() as u64,
            )),
            wiki_delay: Duration::from_millis(env_u64(
                "YACHTWATCH_WIKI_DELAY_MS",
                defaults.wiki_delay.as_millis() as u64,
            )),
            owner_delay: Duration::from_millis(env_u64(
                "YACHTWATCH_OWNER_DELAY_MS",
                defaults.owner_delay.as_millis() as u64,
            )),
            checkpoint_every: env_usize("YACHTWATCH_CHECKPOINT_EVERY", defaults.checkpoint_every)
                .max(1),
            wiki_min_length: env_u64("YACHTWATCH_WIKI_MIN_LENGTH", defaults.wiki_min_length as u64)
                as u32,
        }
    }
}

/// Debounce and liveness timing for the live-capture flush path.
#[derive(Debug, Clone)]
pub struct FlushConfig {
    /// Quiet period after the last upsert before a flush fires.
    pub debounce: Duration,
    /// Periodic re-flush interval, independent of new data.
    pub interval: Duration,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(5),
            interval: Duration::from_secs(30 * 60),
        }
    }
}

impl FlushConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce: Duration::from_millis(env_u64(
                "YACHTWATCH_FLUSH_DEBOUNCE_MS",
                defaults.debounce.as_millis() as u64,
            )),
            interval: Duration::from_millis(env_u64(
                "YACHTWATCH_FLUSH_INTERVAL_MS",
                defaults.interval.as_millis() as u64,
            )),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EnrichConfig::default();
        assert!(cfg.detail_delay > cfg.wiki_delay);
        assert_eq!(cfg.checkpoint_every, 5);
        assert_eq!(cfg.wiki_min_length, 30);
    }
}
