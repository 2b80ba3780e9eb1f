//! Pairs the task and due-marker buffers over a single store

use std::sync::Arc;

use chrono::NaiveDate;

use crate::buffer::{BufferError, DueBuffer, TaskBuffer};
use crate::dates::Month;
use crate::store::RecordStore;


/// The data source of the presentation layer: one [`TaskBuffer`] and one [`DueBuffer`], sharing one store.
///
/// Both buffers work on disjoint record kinds, so they never need to be locked together.
#[derive(Debug)]
pub struct Planner<S> {
    store: Arc<S>,
    tasks: TaskBuffer<S>,
    due_markers: DueBuffer<S>,
}

impl<S> Planner<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            tasks: TaskBuffer::new(Arc::clone(&store)),
            due_markers: DueBuffer::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S>                  { &self.store       }
    pub fn tasks(&self) -> &TaskBuffer<S>           { &self.tasks       }
    pub fn due_markers(&self) -> &DueBuffer<S>      { &self.due_markers }

    /// Load the month `date` belongs to into both buffers
    pub async fn load_month(&self, date: NaiveDate) -> Result<(), BufferError> {
        let (tasks, due_markers) = tokio::join!(
            self.tasks.load_month(date),
            self.due_markers.load_month(date),
        );
        tasks?;
        due_markers?;
        log::info!("Loaded {}", Month::of(date));
        Ok(())
    }
}
