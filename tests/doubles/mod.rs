//! Test doubles shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Semaphore;

use daybook::store::local::LocalStore;
use daybook::store::{RecordPatch, RecordScan, RecordStore, StoreError};
use daybook::{Record, RecordId};

/// Where a held scan waits
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hold {
    /// Before reading the store: the scan sees every write made while it was held
    BeforeRead,
    /// After reading the store: the scan misses every write made while it was held
    AfterRead,
}

/// A [`LocalStore`] that counts its range scans, and that can hold them until the test releases them
pub struct GatedStore {
    inner: LocalStore,
    n_scans: AtomicUsize,
    gate: Mutex<Option<(Hold, Arc<Semaphore>)>>,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: LocalStore::in_memory(),
            n_scans: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &LocalStore {
        &self.inner
    }

    pub fn scan_count(&self) -> usize {
        self.n_scans.load(Ordering::SeqCst)
    }

    /// Every scan started from now on will wait for [`Self::release_scans`]
    pub fn hold_scans(&self, hold: Hold) {
        *self.gate.lock().unwrap() = Some((hold, Arc::new(Semaphore::new(0))));
    }

    /// Let `n` held scans complete
    pub fn release_scans(&self, n: usize) {
        if let Some((_, semaphore)) = self.gate.lock().unwrap().as_ref() {
            semaphore.add_permits(n);
        }
    }

    /// Yield to other tasks until `n` scans have been started
    pub async fn wait_for_scans(&self, n: usize) {
        for _ in 0..1000 {
            if self.scan_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("Only {} scans started, expected {}", self.scan_count(), n);
    }

    fn current_gate(&self) -> Option<(Hold, Arc<Semaphore>)> {
        self.gate.lock().unwrap().clone()
    }
}

async fn pass(semaphore: &Semaphore) {
    semaphore.acquire().await.unwrap().forget();
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn add<R: Record>(&self, record: &R) -> Result<RecordId, StoreError> {
        self.inner.add(record).await
    }

    async fn delete<R: Record>(&self, id: RecordId) -> Result<(), StoreError> {
        self.inner.delete::<R>(id).await
    }

    async fn update<R: Record>(&self, id: RecordId, patch: RecordPatch) -> Result<(), StoreError> {
        self.inner.update::<R>(id, patch).await
    }

    async fn get<R: Record>(&self, id: RecordId) -> Result<R, StoreError> {
        self.inner.get::<R>(id).await
    }

    async fn range_scan<R: Record>(&self, from: NaiveDate, to: NaiveDate) -> Result<RecordScan<R>, StoreError> {
        self.n_scans.fetch_add(1, Ordering::SeqCst);
        match self.current_gate() {
            None => self.inner.range_scan::<R>(from, to).await,
            Some((Hold::BeforeRead, semaphore)) => {
                pass(&semaphore).await;
                self.inner.range_scan::<R>(from, to).await
            },
            Some((Hold::AfterRead, semaphore)) => {
                let scan = self.inner.range_scan::<R>(from, to).await;
                pass(&semaphore).await;
                scan
            },
        }
    }
}

/// Yield to other tasks a few times, so that spawned tasks can progress
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
