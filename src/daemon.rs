//! The long-lived daemon loop.
//!
//! Provisioning runs once at startup and is fatal on failure. After that the
//! loop owns the process: sleep for the poll interval (in one-second
//! increments so Ctrl-C is honored promptly), ask the schedule what is due,
//! and run the publisher synchronously for each due trigger. Publish
//! failures are logged and absorbed; the next day's run is unaffected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::config::Config;
use crate::git::GitCli;
use crate::provision::provision;
use crate::publish::Publisher;
use crate::schedule::{Schedule, TriggerId};

/// Provision the working copy, then run the scheduler loop until the
/// process is terminated.
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let git = GitCli::new();
    provision(&git, &config.repo_path, &config.remote_url).inspect_err(|e| {
        log::error!("repository setup failed: {}", e);
    })?;

    let commit_time = config.commit_time()?;
    let publisher = Publisher::new(config.repo_path.clone(), config.marker_file.clone());

    let mut schedule = Schedule::new();
    let publish_trigger = schedule.add_daily(commit_time, Local::now().naive_local());

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    if let Some(next) = schedule.next_due(Local::now().naive_local()) {
        log::info!("scheduler armed; next publish at {}", next);
    }

    loop {
        // Sleep in small increments to check shutdown more often
        for _ in 0..config.poll_interval_secs {
            if shutdown.load(Ordering::SeqCst) {
                log::info!("shutting down");
                return Ok(());
            }
            thread::sleep(Duration::from_secs(1));
        }

        run_pending(&mut schedule, Local::now().naive_local(), |id| {
            if id == publish_trigger {
                run_publish(&publisher);
            }
        });
    }
}

/// Run every trigger due at `now` through `job`.
///
/// Separated from the wall-clock loop so trigger dispatch can be tested
/// with injected times and jobs.
fn run_pending<F: FnMut(TriggerId)>(schedule: &mut Schedule, now: NaiveDateTime, mut job: F) {
    for id in schedule.due(now) {
        job(id);
    }
}

fn run_publish(publisher: &Publisher) {
    match publisher.publish() {
        Ok(summary) => {
            log::info!(
                "published commit {} ({})",
                &summary.commit[..12.min(summary.commit.len())],
                summary.timestamp
            );
        }
        Err(e) => {
            log::error!("publish failed: {}", e);
        }
    }
}
