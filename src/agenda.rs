//! How a day's tasks are listed, and what the calendar shows for each day of a month

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::buffer::BufferError;
use crate::dates::Month;
use crate::planner::Planner;
use crate::record::{DueMarker, Record, Task};
use crate::store::RecordStore;

/// The order tasks are listed in. Uncompleted tasks always come first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortMode {
    /// Most recently added first
    DateAdded,
    /// Most stars first
    Priority,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::DateAdded
    }
}

impl SortMode {
    fn compare(&self, left: &Task, right: &Task) -> Ordering {
        left.completed().cmp(&right.completed())
            .then_with(|| match self {
                SortMode::DateAdded => right.id().cmp(&left.id()),
                SortMode::Priority => right.priority().cmp(&left.priority()),
            })
    }
}

/// Sort `tasks` for display, optionally dropping the completed ones
pub fn arrange(mut tasks: Vec<Task>, mode: SortMode, hide_completed: bool) -> Vec<Task> {
    if hide_completed {
        tasks.retain(|task| !task.completed());
    }
    tasks.sort_by(|left, right| mode.compare(left, right));
    tasks
}


/// How many tasks of a day are still to do, and how many are done
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayTally {
    pub todo: usize,
    pub completed: usize,
}

impl DayTally {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed()).count();
        Self { todo: tasks.len() - completed, completed }
    }

    pub fn total(&self) -> usize {
        self.todo + self.completed
    }
}


/// What a calendar cell displays
#[derive(Clone, Debug, PartialEq)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub tally: DayTally,
    pub due_markers: Vec<DueMarker>,
}

/// One [`DayOverview`] for every day of `month`, in order.
///
/// This goes through the planner's buffers, so that `month` gets loaded in case it is not buffered yet.
pub async fn month_overview<S>(planner: &Planner<S>, month: Month) -> Result<Vec<DayOverview>, BufferError>
where
    S: RecordStore + 'static,
{
    // Ask for every day before waiting for any, so that each buffer starts a single load
    let handles: Vec<_> = month.days()
        .map(|date| (date, planner.tasks().get_day(date), planner.due_markers().get_day(date)))
        .collect();

    let mut overview = Vec::with_capacity(handles.len());
    for (date, tasks, due_markers) in handles {
        let tasks = tasks.await?;
        let mut due_markers = due_markers.await?;
        due_markers.sort_by_key(|marker| marker.timestamp());
        overview.push(DayOverview {
            date,
            tally: DayTally::of(&tasks),
            due_markers,
        });
    }
    Ok(overview)
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::RecordId;

    fn stored_task(id: u64, priority: u8, completed: bool) -> Task {
        let date = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        let mut task = Task::new(format!("Task {}", id), String::new(), date, priority)
            .with_completed(completed);
        task.set_id(RecordId::new(id));
        task
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id().unwrap().as_u64()).collect()
    }

    #[test]
    fn date_added_lists_newest_uncompleted_first() {
        let tasks = vec![
            stored_task(1, 5, false),
            stored_task(2, 1, true),
            stored_task(3, 2, false),
            stored_task(4, 4, true),
        ];
        let arranged = arrange(tasks, SortMode::DateAdded, false);
        assert_eq!(ids(&arranged), vec![3, 1, 4, 2]);
    }

    #[test]
    fn priority_lists_most_stars_first() {
        let tasks = vec![
            stored_task(1, 2, false),
            stored_task(2, 5, true),
            stored_task(3, 4, false),
            stored_task(4, 4, false),
        ];
        let arranged = arrange(tasks, SortMode::Priority, false);
        // Ties keep their original order
        assert_eq!(ids(&arranged), vec![3, 4, 1, 2]);
    }

    #[test]
    fn hide_completed() {
        let tasks = vec![
            stored_task(1, 2, true),
            stored_task(2, 3, false),
        ];
        let arranged = arrange(tasks, SortMode::default(), true);
        assert_eq!(ids(&arranged), vec![2]);
    }

    #[test]
    fn tally() {
        let tasks = vec![
            stored_task(1, 2, true),
            stored_task(2, 3, false),
            stored_task(3, 3, false),
        ];
        let tally = DayTally::of(&tasks);
        assert_eq!(tally, DayTally { todo: 2, completed: 1 });
        assert_eq!(tally.total(), 3);
        assert_eq!(DayTally::of(&[]), DayTally::default());
    }
}
