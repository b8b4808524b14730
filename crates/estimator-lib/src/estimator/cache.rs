//! Process-wide estimator cache
//!
//! Populated lazily and never invalidated. Each model type owns a slot with
//! its own lock: concurrent first requests for one model type load its
//! artifact once, while requests for other model types proceed. The map lock
//! is only held to find or create a slot. Failed loads are not cached; the
//! next request retries.

use super::{Estimator, EstimatorSource};
use crate::error::{EstimateError, Result};
use crate::observability::EstimatorMetrics;
use crate::registry::ModelType;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use tracing::{debug, warn};

/// One model type's estimator, empty until its first successful load
type Slot = Mutex<Option<Arc<dyn Estimator>>>;

pub struct EstimatorCache {
    source: Box<dyn EstimatorSource>,
    slots: Mutex<HashMap<ModelType, Arc<Slot>>>,
    loaded: AtomicUsize,
    metrics: EstimatorMetrics,
}

/// Outcome of warming the cache
#[derive(Debug, Clone, Default)]
pub struct PreloadReport {
    pub loaded: Vec<ModelType>,
    pub missing: Vec<ModelType>,
    pub failed: Vec<(ModelType, String)>,
}

/// Slots only change on a successful load, so a poisoned guard still holds
/// consistent data
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EstimatorCache {
    pub fn new(source: impl EstimatorSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: Mutex::new(HashMap::new()),
            loaded: AtomicUsize::new(0),
            metrics: EstimatorMetrics::new(),
        }
    }

    fn slot(&self, model_type: ModelType) -> Arc<Slot> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(model_type).or_default())
    }

    /// Return the cached estimator, loading it on first request
    pub fn get(&self, model_type: ModelType) -> Result<Arc<dyn Estimator>> {
        let slot = self.slot(model_type);
        let mut entry = lock(&slot);
        if let Some(estimator) = entry.as_ref() {
            self.metrics.inc_cache_hits();
            return Ok(Arc::clone(estimator));
        }

        self.metrics.inc_cache_misses();
        let estimator = self.source.load(model_type)?;
        *entry = Some(Arc::clone(&estimator));
        let cached = self.loaded.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.set_estimators_loaded(cached as i64);
        debug!(model_type = %model_type, cached = cached, "Estimator cached");
        Ok(estimator)
    }

    /// Never waits on an in-flight load; a model type still loading counts
    /// as not cached
    pub fn is_cached(&self, model_type: ModelType) -> bool {
        let slot = lock(&self.slots).get(&model_type).cloned();
        slot.map_or(false, |slot| slot_is_filled(&slot))
    }

    pub fn cached_models(&self) -> Vec<ModelType> {
        let slots: Vec<(ModelType, Arc<Slot>)> = lock(&self.slots)
            .iter()
            .map(|(model_type, slot)| (*model_type, Arc::clone(slot)))
            .collect();
        let mut models: Vec<_> = slots
            .into_iter()
            .filter(|(_, slot)| slot_is_filled(slot))
            .map(|(model_type, _)| model_type)
            .collect();
        models.sort();
        models
    }

    pub fn is_available(&self, model_type: ModelType) -> bool {
        self.is_cached(model_type) || self.source.is_available(model_type)
    }

    /// Load every given model type, collecting failures instead of stopping
    pub fn preload(&self, model_types: &[ModelType]) -> PreloadReport {
        let mut report = PreloadReport::default();
        for &model_type in model_types {
            match self.get(model_type) {
                Ok(_) => report.loaded.push(model_type),
                Err(EstimateError::EstimatorNotFound { path, .. }) => {
                    warn!(model_type = %model_type, path = %path.display(), "Estimator artifact missing");
                    report.missing.push(model_type);
                }
                Err(e) => {
                    warn!(model_type = %model_type, error = %e, "Estimator failed to load");
                    report.failed.push((model_type, e.to_string()));
                }
            }
        }
        report
    }
}

fn slot_is_filled(slot: &Slot) -> bool {
    match slot.try_lock() {
        Ok(entry) => entry.is_some(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
        Err(TryLockError::WouldBlock) => false,
    }
}
