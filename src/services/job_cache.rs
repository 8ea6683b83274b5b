use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::job::Job;

#[derive(Debug)]
struct Entry {
    stored_at: Instant,
    jobs: Arc<Vec<Job>>,
}

/// Cache-aside copy of the full job table.
///
/// Entries live for at most `ttl`; writes made through this process also
/// invalidate. Writes from other processes stay invisible for up to `ttl`.
/// A zero ttl disables caching.
#[derive(Clone, Debug)]
pub struct JobCache {
    ttl: Duration,
    entry: Arc<Mutex<Option<Entry>>>,
}

impl JobCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Arc::new(Mutex::new(None)),
        }
    }

    pub fn get(&self) -> Option<Arc<Vec<Job>>> {
        let guard = self.entry.lock().ok()?;
        let entry = guard.as_ref()?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(Arc::clone(&entry.jobs))
        } else {
            None
        }
    }

    pub fn put(&self, jobs: Vec<Job>) -> Arc<Vec<Job>> {
        let jobs = Arc::new(jobs);
        if self.ttl.is_zero() {
            return jobs;
        }
        if let Ok(mut guard) = self.entry.lock() {
            *guard = Some(Entry {
                stored_at: Instant::now(),
                jobs: Arc::clone(&jobs),
            });
        }
        jobs
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.entry.lock() {
            guard.take();
        }
    }
}
