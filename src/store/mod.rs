//! Durable storage for records, and the interface the buffers consume
//!
//! A [`RecordStore`] keeps one table per [`RecordKind`], hands out identifiers, and is able to scan a table
//! in date order. [`local::LocalStore`] is the implementation this crate provides.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::record::{Record, RecordId, RecordKind};

pub mod local;


/// Errors returned by a [`RecordStore`]
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be created or opened. Nothing else will work
    Open { path: PathBuf, reason: String },
    /// A single write (add, delete, update) failed. Nothing has been modified
    Write(String),
    /// A read or a range scan failed
    Access(String),
    /// No record of this kind has this identifier
    NotFound { kind: RecordKind, id: RecordId },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, reason } => write!(f, "unable to open store {:?}: {}", path, reason),
            Self::Write(reason) => write!(f, "store write failed: {}", reason),
            Self::Access(reason) => write!(f, "store access failed: {}", reason),
            Self::NotFound { kind, id } => write!(f, "no {} with id {}", kind, id),
        }
    }
}

impl Error for StoreError {}


/// A set of fields to overwrite on a stored record
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordPatch {
    fields: Map<String, Value>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `field` with `value`
    pub fn set<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Merge this patch onto a serialized record. Fails if `target` is not a JSON object.
    pub(crate) fn apply_to(&self, target: &mut Value) -> Result<(), StoreError> {
        let object = target.as_object_mut()
            .ok_or_else(|| StoreError::Write("stored record is not an object".to_string()))?;
        for (field, value) in &self.fields {
            if field == "id" {
                return Err(StoreError::Write("identifiers cannot be patched".to_string()));
            }
            object.insert(field.clone(), value.clone());
        }
        Ok(())
    }
}


/// The result of [`RecordStore::range_scan`].
///
/// This is a finite iterator over a snapshot of the matching records, ascending by date (records of the same date
/// come in identifier order). Records are only decoded when they are reached. Call `range_scan` again to restart.
#[derive(Debug)]
pub struct RecordScan<R> {
    rows: std::vec::IntoIter<(RecordId, Value)>,
    phantom: PhantomData<R>,
}

impl<R: Record> RecordScan<R> {
    pub fn new(rows: Vec<(RecordId, Value)>) -> Self {
        Self { rows: rows.into_iter(), phantom: PhantomData }
    }

    /// A scan that matched nothing
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: Record> Iterator for RecordScan<R> {
    type Item = Result<R, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, row) = self.rows.next()?;
        Some(decode(id, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Turn a stored row back into a record, with its identifier set
pub(crate) fn decode<R: Record>(id: RecordId, row: Value) -> Result<R, StoreError> {
    let mut record: R = serde_json::from_value(row)
        .map_err(|err| StoreError::Access(format!("undecodable {} {}: {}", R::KIND, id, err)))?;
    record.set_id(id);
    Ok(record)
}


/// A durable store of records, with an ordered date index.
///
/// Every method is generic over the record type, whose [`Record::KIND`] selects the table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new record and return the identifier it has been given.
    /// Any identifier already set on `record` is ignored.
    async fn add<R: Record>(&self, record: &R) -> Result<RecordId, StoreError>;

    /// Delete a record. Deleting an identifier that does not exist is not an error.
    async fn delete<R: Record>(&self, id: RecordId) -> Result<(), StoreError>;

    /// Overwrite some fields of an existing record
    async fn update<R: Record>(&self, id: RecordId, patch: RecordPatch) -> Result<(), StoreError>;

    /// Fetch a record by its identifier
    async fn get<R: Record>(&self, id: RecordId) -> Result<R, StoreError>;

    /// Returns every record whose day lies in `from..=to`, ordered by date.
    /// Matching nothing is not an error.
    async fn range_scan<R: Record>(&self, from: NaiveDate, to: NaiveDate) -> Result<RecordScan<R>, StoreError>;
}
