//! Some utility functions

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::agenda::DayOverview;
use crate::dates::Month;
use crate::record::{DueIcon, DueMarker, Record, Task};
use crate::store::{RecordStore, StoreError};

/// Lock a mutex. A panic while it was locked does not make its data unusable to us
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


/// A debug utility that pretty-prints the tasks of a day
pub fn print_day(date: NaiveDate, tasks: &[Task]) {
    println!("{}", date.format("%A %Y-%m-%d"));
    if tasks.is_empty() {
        println!("    No tasks");
    }
    for task in tasks {
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let id = task.id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    let stars = "*".repeat(task.priority() as usize);
    println!("    {} {:<5} {}\t{}\t(#{})", completion, stars, task.title(), task.subtitle(), id);
}

/// A debug utility that pretty-prints what a calendar would show
pub fn print_month_overview(month: Month, overview: &[DayOverview]) {
    println!("---- {} ----", month);
    for day in overview {
        let markers: Vec<String> = day.due_markers.iter()
            .map(|marker| format!("[{}] {}", marker.icon(), marker.title()))
            .collect();
        println!("  {:>2}  todo {:>2}  done {:>2}  {}",
            day.date.format("%d"), day.tally.todo, day.tally.completed, markers.join(", "));
    }
}


/// Fill a month with some sample tasks and due markers. The same month always gets the same samples.
///
/// Returns how many records have been added
pub async fn seed_demo_month<S: RecordStore>(store: &S, month: Month) -> Result<usize, StoreError> {
    let mut n_added = 0;

    for date in month.days() {
        let day = date.day() as usize;

        let n_tasks = (day * 7) % 5;
        for n in 0..n_tasks {
            let priority = ((day + n) % 5 + 1) as u8;
            let task = Task::new(format!("Task {}", n + 1), format!("Subtitle {}", n + 1), date, priority)
                .with_completed((day + n) % 3 == 0);
            store.add(&task).await?;
            n_added += 1;
        }

        if day % 9 == 0 {
            let icon = DueIcon::ALL[day % DueIcon::ALL.len()];
            let due = DueMarker::new(format!("Due {}", day), date.and_time(NaiveTime::MIN) + chrono::Duration::hours(5), icon);
            store.add(&due).await?;
            n_added += 1;
        }
    }

    log::info!("Seeded {} records in {}", n_added, month);
    Ok(n_added)
}
