use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::limits::{default_in_flight, in_flight_from_env, MAX_IN_FLIGHT};

pub const DRAIN_IDLE_ENV: &str = "CRAFTING_DRAIN_IDLE_MS";

const DEFAULT_BOTTOM_UP_WORKERS: usize = 4;
const DEFAULT_RESULT_CAPACITY: usize = 100;
const DEFAULT_DRAIN_IDLE: Duration = Duration::from_millis(500);
const MAX_DRAIN_IDLE_MS: u64 = 60_000;

/// Which engines run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Top-down expansion from the target only
    #[default]
    TopDown,

    /// Top-down raced against bottom-up, first finisher cancels the other
    Bidirectional,
}

/// How many recipes the top-down engine takes per item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopDownStrategy {
    /// Several recipes per item, bounded by the quota
    #[default]
    MultiRecipe,

    /// At most one recipe per item, quota ignored
    SingleRecipe,
}

/// Order in which pending items are taken off the work-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    #[default]
    DepthFirst,
    BreadthFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// Single thread, no spawned tasks
    Sequential,

    /// Expansions fan out over tokio tasks while slots are free
    #[default]
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottomUpStrategy {
    /// Tier-by-tier sweep with a worker pool
    #[default]
    Tiered,

    /// Forward depth-first walk through consuming recipes
    DepthFirst,
}

/// Validated settings of one search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub recipe_limit: u32,
    pub mode: SearchMode,
    pub strategy: TopDownStrategy,
    pub traversal: Traversal,
    pub execution: Execution,
    pub bottom_up: BottomUpStrategy,

    /// Concurrent top-down expansions; `None` derives it from `recipe_limit`
    pub max_in_flight: Option<usize>,
    pub bottom_up_workers: usize,
    pub result_capacity: usize,

    /// Quiet period after which a bottom-up tier counts as drained
    pub drain_idle: Duration,

    /// Pause between streamed snapshots
    pub snapshot_delay: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recipe_limit: 1,
            mode: SearchMode::default(),
            strategy: TopDownStrategy::default(),
            traversal: Traversal::default(),
            execution: Execution::default(),
            bottom_up: BottomUpStrategy::default(),
            max_in_flight: None,
            bottom_up_workers: DEFAULT_BOTTOM_UP_WORKERS,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            drain_idle: DEFAULT_DRAIN_IDLE,
            snapshot_delay: Duration::ZERO,
        }
    }
}

/// On-disk / wire form; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSearchConfig {
    pub recipe_limit: Option<i64>,
    pub mode: Option<SearchMode>,
    pub strategy: Option<TopDownStrategy>,
    pub traversal: Option<Traversal>,
    pub execution: Option<Execution>,
    pub bottom_up: Option<BottomUpStrategy>,
    pub max_in_flight: Option<usize>,
    pub bottom_up_workers: Option<usize>,
    pub result_capacity: Option<usize>,
    pub drain_idle_ms: Option<u64>,
    pub snapshot_delay_ms: Option<u64>,
}

impl SearchConfig {
    pub fn with_recipe_limit(recipe_limit: u32) -> Self {
        Self {
            recipe_limit,
            ..Self::default()
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: RawSearchConfig = serde_json::from_slice(bytes)
            .map_err(|e| SearchError::Config(format!("failed to parse config: {e}")))?;
        Self::from_raw(raw)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            SearchError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_raw(raw: RawSearchConfig) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply(raw)?;
        Ok(cfg)
    }

    /// Overlay every field that `raw` sets
    pub fn apply(&mut self, raw: RawSearchConfig) -> Result<()> {
        if let Some(limit) = raw.recipe_limit {
            self.recipe_limit = parse_recipe_limit(limit)?;
        }
        if let Some(mode) = raw.mode {
            self.mode = mode;
        }
        if let Some(strategy) = raw.strategy {
            self.strategy = strategy;
        }
        if let Some(traversal) = raw.traversal {
            self.traversal = traversal;
        }
        if let Some(execution) = raw.execution {
            self.execution = execution;
        }
        if let Some(bottom_up) = raw.bottom_up {
            self.bottom_up = bottom_up;
        }
        if raw.max_in_flight.is_some() {
            self.max_in_flight = raw.max_in_flight;
        }
        if let Some(workers) = raw.bottom_up_workers {
            self.bottom_up_workers = workers;
        }
        if let Some(capacity) = raw.result_capacity {
            self.result_capacity = capacity;
        }
        if let Some(ms) = raw.drain_idle_ms {
            self.drain_idle = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.snapshot_delay_ms {
            self.snapshot_delay = Duration::from_millis(ms);
        }
        self.validate()
    }

    /// Environment overrides (`CRAFTING_MAX_IN_FLIGHT`, `CRAFTING_DRAIN_IDLE_MS`)
    pub fn apply_env(&mut self) {
        if std::env::var_os(crate::limits::MAX_IN_FLIGHT_ENV).is_some() {
            self.max_in_flight = Some(in_flight_from_env(self.in_flight()));
        }
        let raw = std::env::var(DRAIN_IDLE_ENV).ok();
        self.drain_idle = parse_drain_idle(raw.as_deref(), self.drain_idle);
    }

    pub fn validate(&self) -> Result<()> {
        if self.recipe_limit == 0 {
            return Err(SearchError::InvalidQuota(0));
        }
        if self.bottom_up_workers == 0 {
            return Err(SearchError::Config(
                "bottom_up_workers must be at least 1".to_string(),
            ));
        }
        if self.result_capacity == 0 {
            return Err(SearchError::Config(
                "result_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective number of concurrent top-down expansions
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .unwrap_or_else(|| default_in_flight(self.recipe_limit))
            .min(MAX_IN_FLIGHT)
    }
}

/// Recipe limits arrive as signed numbers from config files and query strings
pub fn parse_recipe_limit(raw: i64) -> Result<u32> {
    match u32::try_from(raw) {
        Ok(limit) if limit >= 1 => Ok(limit),
        _ => Err(SearchError::InvalidQuota(raw)),
    }
}

fn parse_drain_idle(raw: Option<&str>, default_value: Duration) -> Duration {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|ms| Duration::from_millis(ms.min(MAX_DRAIN_IDLE_MS)))
        .unwrap_or(default_value)
}
