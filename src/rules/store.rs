//! Per-domain rule cache.
//!
//! # Responsibilities
//! - Hold the most recently loaded rule file for every known domain
//! - Rebuild the whole cache when the refresh interval has elapsed
//! - Load or synthesize a single domain's rule file on a cache miss
//!
//! # Design Decisions
//! - One `RwLock` guards the cache; lookups share it, writers hold it briefly
//! - Bulk rebuilds stage the new map outside the lock and swap it in whole,
//!   so readers see either the old cache or the new one
//! - Bulk rebuilds are lenient (bad files are skipped), lazy loads are
//!   strict (bad files fail the lookup); see [`LoadPolicy`]
//! - Concurrent misses for the same new domain may both load it; the last
//!   insert wins
//! - If storage cannot be enumerated, a rebuild keeps the current cache
//!   instead of clearing it

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::rules::clock::{Clock, SystemClock};
use crate::rules::error::RuleError;
use crate::rules::matcher::CompiledRuleFile;
use crate::rules::model::RuleFile;
use crate::rules::storage::{validate_domain, RuleStorage};

/// How long a bulk-loaded cache is trusted before it is rebuilt.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// What to do when a stored rule file cannot be read, parsed or compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Fail the load. Used for single-domain loads on a cache miss.
    Strict,
    /// Log, skip the file and carry on. Used for bulk rebuilds.
    Lenient,
}

impl LoadPolicy {
    fn apply(
        self,
        location: &str,
        outcome: Result<Option<CompiledRuleFile>, RuleError>,
    ) -> Result<Option<CompiledRuleFile>, RuleError> {
        match outcome {
            Err(e) if self == LoadPolicy::Lenient => {
                tracing::warn!(location = %location, error = %e, "Skipping rule file");
                metrics::record_rule_file_skipped();
                Ok(None)
            }
            other => other,
        }
    }
}

/// Parse and compile raw rule file bytes.
pub fn parse_rule_file(bytes: &[u8], location: &str) -> Result<CompiledRuleFile, RuleError> {
    let file: RuleFile = serde_json::from_slice(bytes).map_err(|source| RuleError::Malformed {
        location: location.to_string(),
        source,
    })?;
    CompiledRuleFile::compile(file, location)
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, Arc<CompiledRuleFile>>,
    last_refresh: Instant,
}

/// Thread-safe store of compiled rule files, keyed by domain.
#[derive(Debug)]
pub struct RuleStore {
    storage: Arc<dyn RuleStorage>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    default_response: String,
    cache: RwLock<CacheState>,
}

impl RuleStore {
    /// Create a store on the system clock with the default refresh interval.
    pub fn new(storage: Arc<dyn RuleStorage>, default_response: impl Into<String>) -> Self {
        Self::with_clock(
            storage,
            Arc::new(SystemClock),
            DEFAULT_REFRESH_INTERVAL,
            default_response,
        )
    }

    /// Create a store and warm it with everything currently in storage.
    pub fn with_clock(
        storage: Arc<dyn RuleStorage>,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
        default_response: impl Into<String>,
    ) -> Self {
        let last_refresh = clock.now();
        let store = Self {
            storage,
            clock,
            refresh_interval,
            default_response: default_response.into(),
            cache: RwLock::new(CacheState {
                entries: HashMap::new(),
                last_refresh,
            }),
        };
        store.rebuild();

        tracing::info!(
            refresh_interval_secs = refresh_interval.as_secs(),
            cached = store.cached_domains().len(),
            "Rule store initialized"
        );
        store
    }

    /// Return the rule file for `domain`, loading or creating it if needed.
    pub fn get_rule_file(&self, domain: &str) -> Result<Arc<CompiledRuleFile>, RuleError> {
        self.refresh_if_stale();
        validate_domain(domain)?;

        if let Some(file) = self.read_state().entries.get(domain) {
            tracing::debug!(domain = %domain, rules = file.rules().len(), "Rule file served from cache");
            return Ok(Arc::clone(file));
        }

        let location = self.storage.location(domain);
        tracing::debug!(domain = %domain, location = %location, "Rule file not cached, loading");

        let file = match LoadPolicy::Strict.apply(&location, self.load_stored(domain, &location))? {
            Some(file) => {
                tracing::info!(location = %location, rules = file.rules().len(), "Loaded rule file");
                file
            }
            None => self.create_default_rule_file(domain, &location)?,
        };

        let file = Arc::new(file);
        let cached = {
            let mut state = self.write_state();
            state.entries.insert(domain.to_string(), Arc::clone(&file));
            state.entries.len()
        };
        metrics::record_cached_rule_files(cached);
        Ok(file)
    }

    /// Rebuild the whole cache from storage now.
    pub fn refresh(&self) {
        let now = self.clock.now();
        self.write_state().last_refresh = now;
        self.rebuild();
    }

    /// Domains currently cached, sorted.
    pub fn cached_domains(&self) -> Vec<String> {
        let mut domains: Vec<_> = self.read_state().entries.keys().cloned().collect();
        domains.sort();
        domains
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    fn refresh_if_stale(&self) {
        let now = self.clock.now();
        if now.saturating_duration_since(self.read_state().last_refresh) < self.refresh_interval {
            return;
        }

        {
            let mut state = self.write_state();
            // Another caller may have claimed this refresh while we waited.
            if now.saturating_duration_since(state.last_refresh) < self.refresh_interval {
                return;
            }
            state.last_refresh = now;
        }
        self.rebuild();
    }

    /// Stage a fresh cache from storage, then install it in one swap.
    fn rebuild(&self) {
        let domains = match self.storage.list_domains() {
            Ok(domains) => domains,
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate rule files, keeping current cache");
                return;
            }
        };

        let mut staging = HashMap::with_capacity(domains.len());
        for domain in domains {
            let location = self.storage.location(&domain);
            let outcome = match validate_domain(&domain) {
                Ok(()) => self.load_stored(&domain, &location),
                Err(e) => Err(e),
            };
            if let Ok(Some(file)) = LoadPolicy::Lenient.apply(&location, outcome) {
                staging.insert(domain, Arc::new(file));
            }
        }

        let loaded = staging.len();
        self.write_state().entries = staging;

        metrics::record_rule_refresh(loaded);
        tracing::info!(
            loaded,
            next_refresh_secs = self.refresh_interval.as_secs(),
            "Rule cache rebuilt"
        );
    }

    fn load_stored(
        &self,
        domain: &str,
        location: &str,
    ) -> Result<Option<CompiledRuleFile>, RuleError> {
        match self.storage.read(domain)? {
            Some(bytes) => parse_rule_file(&bytes, location).map(Some),
            None => Ok(None),
        }
    }

    fn create_default_rule_file(
        &self,
        domain: &str,
        location: &str,
    ) -> Result<CompiledRuleFile, RuleError> {
        let file = RuleFile::with_default_response(self.default_response.clone());
        let bytes = serde_json::to_vec_pretty(&file).map_err(|source| RuleError::Malformed {
            location: location.to_string(),
            source,
        })?;
        self.storage.write(domain, &bytes)?;

        tracing::info!(domain = %domain, location = %location, "Created default rule file");
        CompiledRuleFile::compile(file, location)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}
