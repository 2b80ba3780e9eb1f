//! Prints what the calendar of a month looks like.
//!
//! Set the RUST_LOG environment variable to display more info about what the buffers do.

use std::sync::Arc;

use chrono::Local;
use clap::Parser;

use daybook::agenda::{arrange, month_overview, SortMode};
use daybook::dates::Month;
use daybook::store::local::LocalStore;
use daybook::store::RecordStore;
use daybook::utils::{print_day, print_month_overview, seed_demo_month};
use daybook::{Planner, Task};


#[derive(Parser, Debug)]
#[command(name = "daybook-month")]
#[command(about = "Print the per-day overview of a month")]
struct Cli {
    /// The month to display, as YYYY-MM (defaults to the current month)
    month: Option<Month>,

    /// Fill the month with sample records first, in case it has no task yet
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let month = cli.month.unwrap_or_else(|| Month::of(Local::now().date_naive()));

    let store = match LocalStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    if let Some(path) = store.backing_file() {
        log::info!("Using the store at {:?}", path);
    }

    if cli.seed {
        let existing = match store.range_scan::<Task>(month.first_day(), month.last_day()).await {
            Ok(scan) => scan.count(),
            Err(err) => {
                log::error!("Unable to read the store: {}", err);
                std::process::exit(1);
            }
        };
        if existing == 0 {
            if let Err(err) = seed_demo_month(&*store, month).await {
                log::error!("Unable to seed {}: {}", month, err);
                std::process::exit(1);
            }
        } else {
            log::info!("{} already has {} task(s), not seeding it", month, existing);
        }
    }

    let planner = Planner::new(store);
    let overview = match month_overview(&planner, month).await {
        Ok(overview) => overview,
        Err(err) => {
            log::error!("Unable to load {}: {}", month, err);
            std::process::exit(1);
        }
    };
    print_month_overview(month, &overview);

    // Detail the busiest day
    let busiest = overview.iter().max_by_key(|day| day.tally.total());
    if let Some(day) = busiest.filter(|day| day.tally.total() > 0) {
        println!();
        match planner.tasks().get_day(day.date).await {
            Ok(tasks) => print_day(day.date, &arrange(tasks, SortMode::Priority, false)),
            Err(err) => log::error!("Unable to list {}: {}", day.date, err),
        }
    }
}
