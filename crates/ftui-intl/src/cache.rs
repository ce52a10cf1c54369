//! Memoizing formatter factory.
//!
//! Compiling a pattern is far more expensive than rendering it, and a UI
//! renders the same few hundred messages over and over. The cache keys
//! compiled formatters by everything that affects compilation.
//!
//! # Key schema
//!
//! | Field     | Purpose                                   |
//! |-----------|-------------------------------------------|
//! | `pattern` | raw text or compiled nodes, compared exactly |
//! | `locale`  | plural rules and locale data              |
//! | `formats` | named number styles                       |
//!
//! # Thread safety
//!
//! The LRU sits behind a `Mutex`. Compilation runs outside the lock; when
//! two threads race on the same key the first insert wins and both get the
//! same formatter. Compile errors are never cached.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHasher};

use crate::config::FormatOptions;
use crate::error::FormatError;
use crate::formatter::{Formatter, FormatterFactory};
use crate::pattern::Pattern;

/// Default number of compiled formatters kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FormatterKey {
    pattern: Pattern,
    locale: String,
    formats: FormatOptions,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatterCacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that compiled.
    pub misses: u64,
    /// Entries currently cached.
    pub size: usize,
    /// Maximum entries.
    pub capacity: usize,
}

impl FormatterCacheStats {
    /// Fraction of lookups answered from the cache (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState {
    lru: LruCache<FormatterKey, Arc<dyn Formatter>, FxBuildHasher>,
    stats: FormatterCacheStats,
}

/// [`FormatterFactory`] decorator that memoizes compiled formatters.
pub struct CachedFormatterFactory<F> {
    inner: F,
    state: Mutex<CacheState>,
}

impl<F: FormatterFactory> CachedFormatterFactory<F> {
    /// Wrap `inner` with room for `capacity` formatters (at least one).
    pub fn new(inner: F, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            state: Mutex::new(CacheState {
                lru: LruCache::with_hasher(cap, FxBuildHasher),
                stats: FormatterCacheStats {
                    capacity: cap.get(),
                    ..FormatterCacheStats::default()
                },
            }),
        }
    }

    /// The wrapped factory.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Current statistics.
    pub fn stats(&self) -> FormatterCacheStats {
        let state = self.lock();
        FormatterCacheStats {
            size: state.lru.len(),
            ..state.stats
        }
    }

    /// Drop every cached formatter and reset counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.lru.clear();
        state.stats = FormatterCacheStats {
            capacity: state.stats.capacity,
            ..FormatterCacheStats::default()
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: FormatterFactory> FormatterFactory for CachedFormatterFactory<F> {
    fn compile(
        &self,
        pattern: &Pattern,
        locale: &str,
        formats: &FormatOptions,
    ) -> Result<Arc<dyn Formatter>, FormatError> {
        let key = FormatterKey {
            pattern: pattern.clone(),
            locale: locale.to_owned(),
            formats: formats.clone(),
        };

        {
            let mut state = self.lock();
            if let Some(formatter) = state.lru.get(&key).cloned() {
                state.stats.hits += 1;
                tracing::trace!(key = key_digest(&key), locale, "formatter cache hit");
                return Ok(formatter);
            }
            state.stats.misses += 1;
        }

        tracing::trace!(key = key_digest(&key), locale, "formatter cache miss");
        let compiled = self.inner.compile(pattern, locale, formats)?;

        let mut state = self.lock();
        if let Some(existing) = state.lru.get(&key) {
            return Ok(Arc::clone(existing));
        }
        state.lru.put(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}

/// Short FxHash of a key for log correlation.
fn key_digest(key: &FormatterKey) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}
