use std::time::Duration;

use clap::Subcommand;
use focusloop_core::storage::MAX_FOCUS_MINUTES;
use focusloop_core::{
    AlertChannel, Config, Database, Event, ItemCatalog, LogAlerts, Phase, PhaseEngine,
    SessionStore, SilentAlerts, SystemClock, TimerDriver, TokioAlerts,
};

type Driver = TimerDriver<SystemClock, Box<dyn AlertChannel>>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session over the given items
    Start {
        /// Item names, focused on in order
        items: Vec<String>,
        /// Add a catalog item by ID (repeatable, appended after names)
        #[arg(long = "item-id")]
        item_ids: Vec<i64>,
        /// Focus minutes per item (defaults to timer.focus_minutes)
        #[arg(long)]
        focus: Option<u32>,
        /// Break minutes after each item (defaults to timer.break_minutes)
        #[arg(long = "break")]
        break_minutes: Option<u32>,
    },
    /// Reconcile with the wall clock and print the current state as JSON
    Status,
    /// Stop the session
    Stop,
    /// Stay in the foreground, ticking once a second until the session ends
    Watch,
}

fn driver(config: &Config, alerts: Box<dyn AlertChannel>) -> Driver {
    let engine = PhaseEngine::new(SessionStore::open());
    let driver = TimerDriver::new(engine, alerts)
        .with_catch_up(config.timer.catch_up_on_foreground);
    match Database::open() {
        Ok(db) => driver.with_history(db),
        Err(e) => {
            tracing::warn!(error = %e, "focus history unavailable");
            driver
        }
    }
}

fn one_shot_alerts(config: &Config) -> Box<dyn AlertChannel> {
    if config.alerts.enabled {
        Box::new(LogAlerts)
    } else {
        Box::new(SilentAlerts)
    }
}

fn print(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

fn resolve_items(
    config: &Config,
    mut names: Vec<String>,
    item_ids: &[i64],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if !item_ids.is_empty() {
        let db = Database::open()?;
        let catalog = db.list_items()?;
        for id in item_ids {
            let item = catalog
                .iter()
                .find(|item| item.id == *id)
                .ok_or_else(|| format!("no item with id {id}"))?;
            names.push(item.name.clone());
        }
    }
    names.retain(|name| !name.trim().is_empty());

    let max = config.timer.max_items as usize;
    if names.len() > max {
        return Err(format!("at most {max} items per session, got {}", names.len()).into());
    }
    Ok(names)
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        TimerAction::Start {
            items,
            item_ids,
            focus,
            break_minutes,
        } => {
            let items = resolve_items(&config, items, &item_ids)?;
            let focus = focus.unwrap_or(config.timer.focus_minutes);
            let break_minutes = break_minutes.unwrap_or(config.timer.break_minutes);
            if focus > MAX_FOCUS_MINUTES || break_minutes > MAX_FOCUS_MINUTES {
                return Err(format!("durations are limited to {MAX_FOCUS_MINUTES} minutes").into());
            }

            let mut driver = driver(&config, one_shot_alerts(&config));
            let event = driver.start(&items, focus, break_minutes)?;
            print(&event)?;
            print(&driver.engine().snapshot())?;
        }
        TimerAction::Status => {
            let mut driver = driver(&config, one_shot_alerts(&config));
            for event in driver.on_foreground() {
                print(&event)?;
            }
            print(&driver.engine().snapshot())?;
        }
        TimerAction::Stop => {
            let mut driver = driver(&config, one_shot_alerts(&config));
            print(&driver.stop())?;
        }
        TimerAction::Watch => {
            let alerts: Box<dyn AlertChannel> = if config.alerts.enabled {
                Box::new(TokioAlerts::new())
            } else {
                Box::new(SilentAlerts)
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async move {
                let driver = driver(&config, alerts);
                watch(driver).await
            })?;
        }
    }
    Ok(())
}

async fn watch(mut driver: Driver) -> Result<(), Box<dyn std::error::Error>> {
    for event in driver.on_foreground() {
        print(&event)?;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        if driver.engine().phase() == Phase::Idle {
            break;
        }
        tokio::select! {
            _ = interval.tick() => {
                for event in driver.on_tick() {
                    print(&event)?;
                }
                let remaining = driver.engine().remaining_seconds();
                eprint!("\r{:02}:{:02} ", remaining / 60, remaining % 60);
            }
            _ = &mut ctrl_c => {
                // The session keeps running in storage; only this process leaves.
                eprintln!();
                tracing::info!("watch interrupted");
                return Ok(());
            }
        }
    }
    eprintln!();
    Ok(())
}
