//! This module provides a local, file-backed record store

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mock_behaviour::MockBehaviour;
use crate::record::{Record, RecordId, RecordKind};
use crate::store::{decode, RecordPatch, RecordScan, RecordStore, StoreError};
use crate::utils::lock;


/// A record store that keeps its tables in memory, and (optionally) mirrors them into a JSON file
#[derive(Debug)]
pub struct LocalStore {
    backing_file: Option<PathBuf>,
    data: Mutex<StoredData>,

    mock_behaviour: Mutex<MockBehaviour>,
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
struct StoredData {
    tasks: Table,
    due_markers: Table,
}

impl StoredData {
    fn table(&self, kind: RecordKind) -> &Table {
        match kind {
            RecordKind::Task => &self.tasks,
            RecordKind::DueMarker => &self.due_markers,
        }
    }

    fn table_mut(&mut self, kind: RecordKind) -> &mut Table {
        match kind {
            RecordKind::Task => &mut self.tasks,
            RecordKind::DueMarker => &mut self.due_markers,
        }
    }
}

/// One record kind. `rows` is the primary storage, `by_date` is the date index.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
struct Table {
    /// The last identifier that has been handed out. Identifiers are never reused
    last_id: u64,
    rows: BTreeMap<RecordId, Row>,

    #[serde(skip)]
    by_date: BTreeSet<(NaiveDateTime, RecordId)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Row {
    timestamp: NaiveDateTime,
    body: Value,
}

impl Table {
    fn next_id(&mut self) -> RecordId {
        self.last_id += 1;
        RecordId::new(self.last_id)
    }

    fn insert(&mut self, id: RecordId, row: Row) {
        let timestamp = row.timestamp;
        // The previous key may equal the new one, drop it before indexing
        if let Some(previous) = self.rows.insert(id, row) {
            self.by_date.remove(&(previous.timestamp, id));
        }
        self.by_date.insert((timestamp, id));
    }

    fn remove(&mut self, id: RecordId) -> Option<Row> {
        let row = self.rows.remove(&id)?;
        self.by_date.remove(&(row.timestamp, id));
        Some(row)
    }

    /// The index is not persisted, rebuild it after loading
    fn reindex(&mut self) {
        self.by_date = self.rows.iter()
            .map(|(id, row)| (row.timestamp, *id))
            .collect();
    }

    fn scan(&self, from: NaiveDate, to: NaiveDate) -> Vec<(RecordId, Value)> {
        let start = (from.and_time(NaiveTime::MIN), RecordId::new(0));
        self.by_date.range(start..)
            .take_while(|(timestamp, _)| timestamp.date() <= to)
            .filter_map(|(_, id)| self.rows.get(id).map(|row| (*id, row.body.clone())))
            .collect()
    }
}


impl LocalStore {
    /// Open (or create) the store named `name`, in the [`STORE_FOLDER`](crate::config::STORE_FOLDER)
    pub fn open(name: &str) -> Result<Self, StoreError> {
        Self::open_at(&crate::config::store_path(name))
    }

    /// Open (or create) the store named after [`DATABASE_NAME`](crate::config::DATABASE_NAME)
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&crate::config::database_name())
    }

    /// Open the store backed by `path`. The file is created if it does not exist yet.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let open_error = |reason: String| StoreError::Open { path: PathBuf::from(path), reason };

        let data = if path.exists() {
            let file = std::fs::File::open(path).map_err(|err| open_error(err.to_string()))?;
            let mut data: StoredData = serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|err| open_error(format!("invalid store file: {}", err)))?;
            data.tasks.reindex();
            data.due_markers.reindex();
            data
        } else {
            log::info!("Creating a new store at {:?}", path);
            let data = StoredData::default();
            save_to_file(path, &data).map_err(|err| open_error(err.to_string()))?;
            data
        };

        Ok(Self {
            backing_file: Some(PathBuf::from(path)),
            data: Mutex::new(data),
            mock_behaviour: Mutex::new(MockBehaviour::new()),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            backing_file: None,
            data: Mutex::new(StoredData::default()),
            mock_behaviour: Mutex::new(MockBehaviour::new()),
        }
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    /// Replace the behaviour tweaks, to make the next operations fail
    pub fn set_mock_behaviour(&self, behaviour: MockBehaviour) {
        *lock(&self.mock_behaviour) = behaviour;
    }

    /// How many records of this kind are stored
    pub fn count(&self, kind: RecordKind) -> usize {
        lock(&self.data).table(kind).rows.len()
    }

    /// Drop every record of every kind, and restart the identifier counters
    pub fn delete_all(&self) -> Result<(), StoreError> {
        self.commit(|data| {
            *data = StoredData::default();
            Ok(())
        })?;
        log::info!("Every record has been deleted");
        Ok(())
    }

    /// Compares two stores to check they have the same records, with the same identifiers
    pub fn has_same_contents_as(&self, other: &Self) -> bool {
        let left = lock(&self.data).clone();
        let right = lock(&other.data).clone();
        left.tasks.rows == right.tasks.rows
            && left.due_markers.rows == right.due_markers.rows
    }

    /// Apply `change`, then persist the result.
    /// In case anything fails, the tables are restored to what they were before.
    fn commit<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoredData) -> Result<T, StoreError>,
    {
        let mut data = lock(&self.data);
        let snapshot = data.clone();

        let result = match change(&mut data) {
            Err(err) => Err(err),
            Ok(value) => match &self.backing_file {
                None => Ok(value),
                Some(path) => match save_to_file(path, &data) {
                    Ok(()) => Ok(value),
                    Err(err) => {
                        log::warn!("Unable to save store {:?}: {}", path, err);
                        Err(StoreError::Write(format!("unable to save {:?}: {}", path, err)))
                    },
                },
            },
        };

        if result.is_err() {
            *data = snapshot;
        }
        result
    }
}

/// Store the tables to a backing file
fn save_to_file(path: &Path, data: &StoredData) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), data)?;
    Ok(())
}

/// Serialize a record for storage. Identifiers are kept out of the body, the row key holds them.
fn encode<R: Record>(record: &R) -> Result<Row, StoreError> {
    let mut body = serde_json::to_value(record)
        .map_err(|err| StoreError::Write(format!("unable to serialize {}: {}", R::KIND, err)))?;
    if let Some(object) = body.as_object_mut() {
        object.remove("id");
    }
    Ok(Row { timestamp: record.timestamp(), body })
}


#[async_trait]
impl RecordStore for LocalStore {
    async fn add<R: Record>(&self, record: &R) -> Result<RecordId, StoreError> {
        lock(&self.mock_behaviour).can_add().map_err(StoreError::Write)?;

        let row = encode(record)?;
        let id = self.commit(|data| {
            let table = data.table_mut(R::KIND);
            let id = table.next_id();
            table.insert(id, row);
            Ok(id)
        })?;
        log::debug!("Added {} {} ({})", R::KIND, id, record.day());
        Ok(id)
    }

    async fn delete<R: Record>(&self, id: RecordId) -> Result<(), StoreError> {
        lock(&self.mock_behaviour).can_delete().map_err(StoreError::Write)?;

        let removed = self.commit(|data| Ok(data.table_mut(R::KIND).remove(id)))?;
        if removed.is_none() {
            log::debug!("Deleting {} {}, which was not in the store", R::KIND, id);
        }
        Ok(())
    }

    async fn update<R: Record>(&self, id: RecordId, patch: RecordPatch) -> Result<(), StoreError> {
        lock(&self.mock_behaviour).can_update().map_err(StoreError::Write)?;

        self.commit(|data| {
            let table = data.table_mut(R::KIND);
            let mut body = match table.rows.get(&id) {
                None => return Err(StoreError::NotFound { kind: R::KIND, id }),
                Some(row) => row.body.clone(),
            };
            patch.apply_to(&mut body)?;

            // Make sure the patched row is still a valid record, and re-file it under its (maybe new) date
            let patched: R = decode(id, body.clone())
                .map_err(|err| StoreError::Write(format!("invalid patch: {}", err)))?;
            table.insert(id, Row { timestamp: patched.timestamp(), body });
            Ok(())
        })
    }

    async fn get<R: Record>(&self, id: RecordId) -> Result<R, StoreError> {
        lock(&self.mock_behaviour).can_get().map_err(StoreError::Access)?;

        let body = match lock(&self.data).table(R::KIND).rows.get(&id) {
            None => return Err(StoreError::NotFound { kind: R::KIND, id }),
            Some(row) => row.body.clone(),
        };
        decode(id, body)
    }

    async fn range_scan<R: Record>(&self, from: NaiveDate, to: NaiveDate) -> Result<RecordScan<R>, StoreError> {
        lock(&self.mock_behaviour).can_range_scan().map_err(StoreError::Access)?;

        if from > to {
            return Ok(RecordScan::empty());
        }
        let rows = lock(&self.data).table(R::KIND).scan(from, to);
        log::trace!("Scanned {} {}(s) from {} to {}", rows.len(), R::KIND, from, to);
        Ok(RecordScan::new(rows))
    }
}
