pub mod plan;
pub mod stats;
pub mod store;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};

/// Wall-clock source. All window boundaries derive from this, so callers
/// decide what "today" means exactly once per invocation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// System wall clock in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Minimal key-value persistence seam: string keys, string values,
/// prefix-filtered listing.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn list_keys(&self, prefix: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}
