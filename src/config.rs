use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

use crate::fantasy::{DeadlineMode, DeadlinePolicy};

/// Fantasy medal ledger: reconcile results and score a league
#[derive(Parser, Debug, Clone)]
#[command(name = "medal-ledger", version, about)]
pub struct Config {
    /// Event catalog (JSON list of events)
    #[arg(long, env = "CATALOG_PATH", default_value = "data/catalog.json")]
    pub catalog_path: PathBuf,

    /// Hand-maintained confirmed results (JSON)
    #[arg(long, env = "CONFIRMED_PATH", default_value = "data/confirmed.json")]
    pub confirmed_path: PathBuf,

    /// League roster with portfolios and risk selections (JSON)
    #[arg(long, env = "LEAGUE_PATH", default_value = "data/league.json")]
    pub league_path: PathBuf,

    /// Raw wikitext endpoint of the medal winners page
    #[arg(
        long,
        env = "SOURCE_URL",
        default_value = "https://en.wikipedia.org/w/index.php?title=List_of_2026_Winter_Olympics_medal_winners&action=raw"
    )]
    pub source_url: String,

    /// Skip the scrape and use confirmed results only
    #[arg(long, env = "SKIP_SCRAPE", default_value = "false")]
    pub skip_scrape: bool,

    /// Documents shorter than this many bytes are treated as unavailable
    #[arg(long, env = "MIN_SOURCE_LEN", default_value = "500")]
    pub min_source_len: usize,

    /// HTTP timeout for the scrape fetch, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "15")]
    pub fetch_timeout_secs: u64,

    /// Risk selections every participant gets before purchased extensions
    #[arg(long, env = "BASE_PICK_CAP", default_value = "5")]
    pub base_pick_cap: u32,

    /// How risk selections lock
    #[arg(long, env = "DEADLINE_MODE", value_enum, default_value = "per-event")]
    pub deadline_mode: DeadlineMode,

    /// League-wide selection deadline (RFC 3339), required in global mode
    #[arg(long, env = "GLOBAL_DEADLINE")]
    pub global_deadline: Option<DateTime<Utc>>,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// Print the snapshot as JSON and exit instead of serving it
    #[arg(long, default_value = "false")]
    pub once: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.skip_scrape {
            url::Url::parse(&self.source_url)
                .map_err(|e| anyhow::anyhow!("SOURCE_URL is not a valid URL: {}", e))?;
        }
        if self.deadline_mode == DeadlineMode::Global && self.global_deadline.is_none() {
            anyhow::bail!("GLOBAL_DEADLINE is required when DEADLINE_MODE is global");
        }
        if self.min_source_len == 0 {
            anyhow::bail!("min_source_len must be positive");
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be positive");
        }
        if self.base_pick_cap == 0 {
            anyhow::bail!("base_pick_cap must be positive");
        }
        Ok(())
    }

    /// Deadline policy; call after `validate`.
    pub fn deadline_policy(&self) -> DeadlinePolicy {
        match (self.deadline_mode, self.global_deadline) {
            (DeadlineMode::Global, Some(deadline)) => DeadlinePolicy::Global(deadline),
            _ => DeadlinePolicy::PerEvent,
        }
    }
}
