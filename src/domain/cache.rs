//! Process-wide memoized dataset with a time-to-live.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::ports::data_port::DataPort;

struct Slot {
    dataset: Arc<Dataset>,
    loaded_at: Instant,
}

pub struct DatasetCache {
    source: Arc<dyn DataPort + Send + Sync>,
    ttl: Duration,
    slot: RwLock<Option<Slot>>,
}

impl DatasetCache {
    pub fn new(source: Arc<dyn DataPort + Send + Sync>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Load eagerly so startup fails on bad input.
    pub fn preload(&self) -> Result<Arc<Dataset>, DashboardError> {
        self.get()
    }

    /// The cached dataset, reloaded through the data port once the TTL has passed.
    ///
    /// A failed reload keeps serving the previous copy until the next TTL expiry.
    pub fn get(&self) -> Result<Arc<Dataset>, DashboardError> {
        {
            let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
            if let Some(s) = slot.as_ref() {
                if s.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&s.dataset));
                }
            }
        }

        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = slot.as_ref() {
            if s.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&s.dataset));
            }
        }

        match self.source.load_dataset() {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                tracing::info!(trades = dataset.trades.len(), "dataset cache refreshed");
                *slot = Some(Slot {
                    dataset: Arc::clone(&dataset),
                    loaded_at: Instant::now(),
                });
                Ok(dataset)
            }
            Err(e) => match slot.as_mut() {
                Some(stale) => {
                    tracing::warn!(error = %e, "dataset reload failed, serving cached copy");
                    stale.loaded_at = Instant::now();
                    Ok(Arc::clone(&stale.dataset))
                }
                None => Err(e),
            },
        }
    }

    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::SentimentObservation;
    use crate::domain::trade::RawTrade;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPort {
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    impl DataPort for CountingPort {
        fn load_sentiment(&self) -> Result<Vec<SentimentObservation>, DashboardError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DashboardError::MissingInput {
                    path: PathBuf::from("gone.csv"),
                });
            }
            Ok(vec![SentimentObservation {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 50.0,
                classification: "Neutral".into(),
            }])
        }

        fn load_trades(&self) -> Result<Vec<RawTrade>, DashboardError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn loads_once_within_ttl() {
        let port = Arc::new(CountingPort::default());
        let cache = DatasetCache::new(port.clone(), Duration::from_secs(3600));
        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(port.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reloads_after_expiry() {
        let port = Arc::new(CountingPort::default());
        let cache = DatasetCache::new(port.clone(), Duration::ZERO);
        cache.get().unwrap();
        cache.get().unwrap();
        assert_eq!(port.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_reload_serves_stale_copy() {
        let port = Arc::new(CountingPort::default());
        let cache = DatasetCache::new(port.clone(), Duration::ZERO);
        let first = cache.get().unwrap();
        port.fail.store(true, Ordering::SeqCst);
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn first_load_failure_propagates() {
        let port = Arc::new(CountingPort::default());
        port.fail.store(true, Ordering::SeqCst);
        let cache = DatasetCache::new(port, Duration::from_secs(60));
        assert!(matches!(cache.get(), Err(DashboardError::MissingInput { .. })));
    }

    #[test]
    fn invalidate_forces_reload() {
        let port = Arc::new(CountingPort::default());
        let cache = DatasetCache::new(port.clone(), Duration::from_secs(3600));
        cache.get().unwrap();
        cache.invalidate();
        cache.get().unwrap();
        assert_eq!(port.loads.load(Ordering::SeqCst), 2);
    }
}
