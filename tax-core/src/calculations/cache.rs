use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::calculator::{TaxCalculator, TaxComputationInput};
use crate::registry::RegimeRegistry;
use crate::{TaxError, TaxResult};

/// Hit and miss counts since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// [`TaxCalculator`] with a process-scoped result cache.
///
/// Keyed on the full [`TaxComputationInput`] after
/// [`normalized`](TaxComputationInput::normalized), and the normalized input
/// is what gets computed. A result therefore never depends on which scale
/// of an amount reached the cache first. Only successful results are stored
/// and entries are never evicted. Safe to share across threads.
#[derive(Debug)]
pub struct MemoizedCalculator<'a> {
    calculator: TaxCalculator<'a>,
    results: RwLock<HashMap<TaxComputationInput, TaxResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<'a> MemoizedCalculator<'a> {
    pub fn new(registry: &'a RegimeRegistry) -> Self {
        Self {
            calculator: TaxCalculator::new(registry),
            results: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached result for `input`, computing and storing it on a
    /// miss. Errors are returned without being cached.
    pub fn calculate(
        &self,
        input: &TaxComputationInput,
    ) -> Result<TaxResult, TaxError> {
        let input = input.normalized();

        // Entries are inserted whole, so a poisoned map is still consistent.
        let cached = self
            .results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&input)
            .cloned();

        if let Some(result) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.calculator.calculate_input(&input)?;

        let mut results = self.results.write().unwrap_or_else(PoisonError::into_inner);
        results.insert(input, result.clone());
        debug!(entries = results.len(), "cached tax result");

        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
