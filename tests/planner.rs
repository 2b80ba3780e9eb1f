//! Both buffers of a Planner, and the month overview built on top of them

mod doubles;

use std::sync::Arc;

use chrono::Datelike;

use daybook::agenda::{arrange, month_overview, DayTally, SortMode};
use daybook::dates::Month;
use daybook::store::local::LocalStore;
use daybook::utils::seed_demo_month;
use daybook::{Planner, RecordKind, Task};

use doubles::{date, GatedStore};


#[tokio::test]
async fn loading_a_month_fills_both_buffers() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(LocalStore::in_memory());
    let june = Month::new(2022, 6).unwrap();
    seed_demo_month(&*store, june).await.unwrap();

    let planner = Planner::new(Arc::clone(&store));
    planner.load_month(date(2022, 6, 12)).await.unwrap();

    assert_eq!(planner.tasks().loaded_month(), Some(june));
    assert_eq!(planner.due_markers().loaded_month(), Some(june));
    assert!(planner.tasks().is_settled());
    assert!(planner.due_markers().is_settled());

    let mut n_tasks = 0;
    for day in june.days() {
        let tasks = planner.tasks().get_day(day);
        assert!(tasks.is_ready());
        n_tasks += tasks.await.unwrap().len();
    }
    assert_eq!(n_tasks, store.count(RecordKind::Task));
}

#[tokio::test]
async fn month_overview_tallies_every_day() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(GatedStore::new());
    let june = Month::new(2022, 6).unwrap();
    seed_demo_month(store.inner(), june).await.unwrap();

    let planner = Planner::new(Arc::clone(&store));
    let overview = month_overview(&planner, june).await.unwrap();

    // One load of tasks, one load of due markers
    assert_eq!(store.scan_count(), 2);

    assert_eq!(overview.len(), 30);
    for (day, expected_date) in overview.iter().zip(june.days()) {
        assert_eq!(day.date, expected_date);
        let n = day.date.day() as usize;
        assert_eq!(day.tally.total(), (n * 7) % 5, "on {}", day.date);
        assert_eq!(day.due_markers.len(), if n % 9 == 0 { 1 } else { 0 }, "on {}", day.date);
    }

    // Day 9 has three tasks, the first one is completed
    assert_eq!(overview[8].tally, DayTally { todo: 2, completed: 1 });

    // Asking again does not reload anything
    month_overview(&planner, june).await.unwrap();
    assert_eq!(store.scan_count(), 2);
}

#[tokio::test]
async fn mutations_show_up_in_the_next_overview() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(LocalStore::in_memory());
    let march = Month::new(2023, 3).unwrap();
    let planner = Planner::new(Arc::clone(&store));
    planner.load_month(march.first_day()).await.unwrap();

    let mut low = Task::new("low".to_string(), String::new(), date(2023, 3, 14), 1);
    let mut high = Task::new("high".to_string(), String::new(), date(2023, 3, 14), 5);
    planner.tasks().add_record(&mut low).await.unwrap();
    planner.tasks().add_record(&mut high).await.unwrap();
    planner.tasks().toggle_completion(&mut high).await.unwrap();

    let overview = month_overview(&planner, march).await.unwrap();
    assert_eq!(overview[13].tally, DayTally { todo: 1, completed: 1 });

    // Completed tasks come last, whatever their priority
    let tasks = planner.tasks().get_day(date(2023, 3, 14)).await.unwrap();
    let arranged = arrange(tasks, SortMode::Priority, false);
    let titles: Vec<&str> = arranged.iter().map(|t| t.title()).collect();
    assert_eq!(titles, vec!["low", "high"]);

    let hidden = arrange(arranged, SortMode::Priority, true);
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].title(), "low");
}
