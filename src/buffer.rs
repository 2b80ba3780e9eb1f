//! An in-memory view of one month of records, indexed by day
//!
//! A [`MonthBuffer`] sits between the presentation layer and a [`RecordStore`]. It loads a whole month with a
//! single range scan, serves per-day lookups (that may complete later, while the month is still loading), and
//! applies add/remove/toggle mutations both to the store and to its buffered copy.
//!
//! Every load bumps a generation counter. A load that has been superseded by a newer one (e.g. because the user
//! navigated quickly from month to month) drops its results instead of resolving days of the newer month.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::dates::{DayKey, Month};
use crate::record::{Record, RecordId, RecordKind, Task};
use crate::resolvable::{Lookup, ResolvableMap};
use crate::store::{RecordPatch, RecordStore, StoreError};
use crate::utils::lock;

/// A buffer of [`Task`]s
pub type TaskBuffer<S> = MonthBuffer<Task, S>;
/// A buffer of [`DueMarker`](crate::record::DueMarker)s
pub type DueBuffer<S> = MonthBuffer<crate::record::DueMarker, S>;


/// Errors returned by a [`MonthBuffer`]
#[derive(Debug)]
pub enum BufferError {
    /// The underlying store failed. The buffer has not been modified
    Store(StoreError),
    /// The load that would have provided this day has been superseded, or has failed
    Unresolved(DayKey),
    /// This record has no identifier, it has never been added to a store
    NotStored(RecordKind),
}

impl Display for BufferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{}", err),
            Self::Unresolved(day) => write!(f, "records of {} were discarded before being loaded", day),
            Self::NotStored(kind) => write!(f, "this {} has never been stored", kind),
        }
    }
}

impl Error for BufferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Unresolved(_) => None,
            Self::NotStored(_) => None,
        }
    }
}

impl From<StoreError> for BufferError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}


/// The records of a single day, as returned by [`MonthBuffer::get_day`].
///
/// Await it to get the records. It may not be ready yet in case its month is still loading.
/// An empty list means "nothing on that day", which is different from "not loaded yet".
#[derive(Debug)]
pub struct DayHandle<R> {
    day: DayKey,
    lookup: Lookup<Vec<R>>,
}

impl<R: Record> DayHandle<R> {
    /// Whether the records are available without waiting
    pub fn is_ready(&self) -> bool {
        self.lookup.is_ready()
    }

    /// The records, in case they are available without waiting
    pub fn try_records(&self) -> Option<Vec<R>> {
        self.lookup.try_value()
    }

    pub async fn wait(self) -> Result<Vec<R>, BufferError> {
        let DayHandle { day, lookup } = self;
        lookup.wait().await.map_err(|_| BufferError::Unresolved(day))
    }
}

impl<R: Record> IntoFuture for DayHandle<R> {
    type Output = Result<Vec<R>, BufferError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}


#[derive(Debug)]
struct BufferState<R> {
    days: ResolvableMap<DayKey, Vec<R>>,
    loaded_month: Option<Month>,
    /// Bumped by every load. Only the latest load may resolve days
    generation: u64,
    /// Whether the latest load has resolved every day of `loaded_month`
    settled: bool,
}

impl<R: Record> BufferState<R> {
    fn new() -> Self {
        Self {
            days: ResolvableMap::new(),
            loaded_month: None,
            generation: 0,
            settled: false,
        }
    }

    /// Forget the current month and start buffering `month`. Returns the generation of this new load
    fn begin_load(&mut self, month: Month) -> u64 {
        self.days.clear();
        self.loaded_month = Some(month);
        self.settled = false;
        self.generation += 1;
        self.generation
    }

    /// A load failed. Unless it has been superseded already, empty the buffer
    fn abandon(&mut self, generation: u64) {
        if self.generation != generation {
            return;
        }
        self.days.clear();
        self.loaded_month = None;
        self.settled = false;
    }

    /// The lookup a mutation of a record filed under `day` should edit,
    /// or `None` when that day is not (and will not be) buffered
    fn editable_day(&mut self, day: NaiveDate) -> Option<(DayKey, Lookup<Vec<R>>)> {
        if self.loaded_month != Some(Month::of(day)) {
            log::debug!("{} is not in the buffered month, leaving the buffer as is", day);
            return None;
        }
        let key = DayKey::from(day);
        if self.settled && !self.days.contains(&key) {
            return None;
        }
        let lookup = self.days.get(&key);
        Some((key, lookup))
    }
}


/// One month of records of a given kind, buffered in memory and indexed by day.
///
/// Cloning a `MonthBuffer` gives another handle to the same buffer.
///
/// [`get_day`](Self::get_day) spawns background loads, it must be called from within a Tokio runtime.
#[derive(Debug)]
pub struct MonthBuffer<R, S> {
    store: Arc<S>,
    state: Arc<Mutex<BufferState<R>>>,
}

impl<R, S> Clone for MonthBuffer<R, S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), state: Arc::clone(&self.state) }
    }
}

impl<R, S> MonthBuffer<R, S>
where
    R: Record,
    S: RecordStore + 'static,
{
    /// Create an empty buffer, bound to `store`
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(BufferState::new())),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The month currently buffered (or being loaded)
    pub fn loaded_month(&self) -> Option<Month> {
        lock(&self.state).loaded_month
    }

    /// Whether every day of the loaded month is available
    pub fn is_settled(&self) -> bool {
        lock(&self.state).settled
    }

    /// Empty the buffer and fill it with the records of the month `date` belongs to.
    ///
    /// In case the store fails, the buffer is left empty and no month is considered loaded.
    /// This returns `Ok` without populating anything in case another load has started in the meantime.
    pub async fn load_month(&self, date: NaiveDate) -> Result<(), BufferError> {
        let month = Month::of(date);
        let generation = lock(&self.state).begin_load(month);
        populate(&*self.store, &*self.state, month, generation).await
    }

    /// The records filed under `date`.
    ///
    /// If `date` is not in the buffered month, this starts loading its month in the background. In that case,
    /// the returned handle completes once the load has reached this day.
    pub fn get_day(&self, date: NaiveDate) -> DayHandle<R> {
        let month = Month::of(date);
        let day = DayKey::from(date);

        let (lookup, reload) = {
            let mut state = lock(&self.state);
            let reload = if state.loaded_month == Some(month) {
                None
            } else {
                Some(state.begin_load(month))
            };
            (state.days.get(&day), reload)
        };

        if let Some(generation) = reload {
            self.spawn_load(month, generation);
        }
        DayHandle { day, lookup }
    }

    fn spawn_load(&self, month: Month, generation: u64) {
        log::debug!("Loading {} in the background", month);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            // Nobody awaits this task, errors can only be reported here.
            // Days that were waiting for this load will complete with `BufferError::Unresolved`
            if let Err(err) = populate(&*store, &*state, month, generation).await {
                log::error!("Unable to load {} {}s: {}", month, R::KIND, err);
            }
        });
    }

    /// Store a new record, and set its identifier.
    ///
    /// If it belongs to the buffered month, it is added to its day as well. Nothing is modified in case the store fails.
    pub async fn add_record(&self, record: &mut R) -> Result<RecordId, BufferError> {
        let id = self.store.add(&*record).await?;
        record.set_id(id);

        let day = record.day();
        let target = {
            let mut state = lock(&self.state);
            let key = DayKey::from(day);
            if state.loaded_month == Some(Month::of(day)) && state.settled && !state.days.contains(&key) {
                // First record of a day the buffer knows nothing about
                state.days.resolve(key, vec![record.clone()]);
                None
            } else {
                state.editable_day(day)
            }
        };

        if let Some((key, lookup)) = target {
            let added = record.clone();
            self.edit_day(key, lookup, move |records| {
                // A load running concurrently may have scanned this record already
                if !records.iter().any(|r| r.id() == Some(id)) {
                    records.push(added);
                }
            }).await;
        }
        Ok(id)
    }

    /// Delete a record from the store, and from its day in the buffer
    pub async fn remove_record(&self, record: &R) -> Result<(), BufferError> {
        let id = record.id().ok_or(BufferError::NotStored(R::KIND))?;
        self.store.delete::<R>(id).await?;

        let target = lock(&self.state).editable_day(record.day());
        if let Some((key, lookup)) = target {
            self.edit_day(key, lookup, move |records| {
                match records.iter().position(|r| r.id() == Some(id)) {
                    Some(index) => { records.remove(index); },
                    None => log::debug!("Removed {} {} was not buffered", R::KIND, id),
                }
            }).await;
        }
        Ok(())
    }

    /// Wait for a buffered day to be available, then edit it.
    /// Nothing happens in case the day has been discarded in the meantime.
    async fn edit_day<F>(&self, key: DayKey, lookup: Lookup<Vec<R>>, edit: F)
    where
        F: FnOnce(&mut Vec<R>),
    {
        if lookup.wait().await.is_err() {
            log::debug!("{} has been discarded from the buffer, not editing it", key);
            return;
        }
        if lock(&self.state).days.modify(&key, edit).is_none() {
            log::debug!("{} is being reloaded, not editing it", key);
        }
    }
}

impl<S> MonthBuffer<Task, S>
where
    S: RecordStore + 'static,
{
    /// Flip the completion status of a task, in the store, in the buffer and in `task`.
    ///
    /// Returns the new completion status
    pub async fn toggle_completion(&self, task: &mut Task) -> Result<bool, BufferError> {
        let id = task.id().ok_or(BufferError::NotStored(RecordKind::Task))?;

        let stored: Task = self.store.get(id).await?;
        let completed = !stored.completed();
        self.store.update::<Task>(id, RecordPatch::new().set("completed", completed)).await?;
        task.set_completed(completed);

        let target = lock(&self.state).editable_day(stored.day());
        if let Some((key, lookup)) = target {
            self.edit_day(key, lookup, move |tasks| {
                for buffered in tasks.iter_mut().filter(|t| t.id() == Some(id)) {
                    buffered.set_completed(completed);
                }
            }).await;
        }
        Ok(completed)
    }
}


/// Scan `month` and resolve each of its days.
/// This does nothing in case `generation` has been superseded by the time the scan completes.
async fn populate<R, S>(store: &S, state: &Mutex<BufferState<R>>, month: Month, generation: u64) -> Result<(), BufferError>
where
    R: Record,
    S: RecordStore,
{
    log::debug!("Loading {} {}s (load #{})", month, R::KIND, generation);
    let scan = match store.range_scan::<R>(month.first_day(), month.last_day()).await {
        Ok(scan) => scan,
        Err(err) => {
            lock(state).abandon(generation);
            return Err(err.into());
        },
    };

    let mut state = lock(state);
    if state.generation != generation {
        log::debug!("Load #{} of {} has been superseded", generation, month);
        return Ok(());
    }

    let n_awaited = state.days.pending_count();

    // Records of a same day are contiguous in the scan
    let mut current_day: Option<DayKey> = None;
    let mut records = Vec::new();
    let mut n_records = 0;
    for record in scan {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                state.abandon(generation);
                return Err(err.into());
            },
        };
        let key = DayKey::from(record.day());
        if current_day.as_ref() != Some(&key) {
            if let Some(previous) = current_day.replace(key) {
                state.days.resolve(previous, std::mem::take(&mut records));
            }
        }
        records.push(record);
        n_records += 1;
    }
    if let Some(last) = current_day {
        state.days.resolve(last, records);
    }

    // Days without records must not stay pending
    for day in month.days() {
        let key = DayKey::from(day);
        if state.days.peek(&key).is_none() {
            state.days.resolve(key, Vec::new());
        }
    }
    state.settled = true;

    log::debug!("Loaded {} {}(s) over {} days of {} ({} days were awaited)",
        n_records, R::KIND, state.days.resolved_count(), month, n_awaited);
    Ok(())
}
