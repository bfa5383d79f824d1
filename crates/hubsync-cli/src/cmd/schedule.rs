//! Schedule command - run passes on the configured update schedule
//!
//! Settings are re-read before every tick, so changing `update_schedule`
//! or the endpoint takes effect without a restart. A tick that cannot run
//! (unreadable `config.toml`, busy database) is logged and the loop waits
//! for the next one. Ctrl-C stops the loop; a pass in progress finishes its
//! current entry first.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use hubsync_core::Settings;
use tokio_util::sync::CancellationToken;

use crate::host::HostLayout;
use crate::ui::Output;

pub async fn schedule(endpoint: Option<&str>, quiet: bool, now: bool) -> Result<()> {
    let output = Output::quiet(quiet);
    let token = CancellationToken::new();

    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current entry");
            on_ctrl_c.cancel();
        }
    });

    let config = crate::config_path();
    let layout = HostLayout::from_home();
    let mut settings = super::load_settings()?;
    let mut run_now = now;
    loop {
        settings = reload_settings(&config, settings);
        let Some(interval) = settings.update_schedule.interval() else {
            output.info("Scheduled updates are disabled (update_schedule = \"never\")");
            return Ok(());
        };

        if !run_now {
            output.info(&format!(
                "Next {} pass in {}",
                settings.update_schedule,
                describe(interval)
            ));
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = token.cancelled() => break,
            }
        }
        run_now = false;

        tick(&layout, &settings, endpoint, &output, &token).await;

        if token.is_cancelled() {
            break;
        }
    }

    output.info("Scheduler stopped");
    Ok(())
}

/// Re-read `config.toml`, keeping `previous` if it cannot be loaded.
fn reload_settings(path: &Path, previous: Settings) -> Settings {
    match Settings::load(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "keeping previous settings for this tick");
            previous
        }
    }
}

/// Run one scheduled pass, returning whether it ran to completion.
async fn tick(
    layout: &HostLayout,
    settings: &Settings,
    endpoint: Option<&str>,
    output: &Output,
    token: &CancellationToken,
) -> bool {
    let engine = match super::engine_at(layout, settings, endpoint, output) {
        Ok(engine) => engine.with_cancellation(token.clone()),
        Err(e) => {
            tracing::warn!(error = format!("{e:#}"), "scheduled pass skipped");
            output.warning(&format!("Scheduled pass skipped: {e:#}"));
            return false;
        }
    };
    match engine.run_sync_pass().await {
        Ok(report) => !report.cancelled,
        Err(e) => {
            tracing::warn!(error = %e, "scheduled pass did not run");
            false
        }
    }
}

fn describe(interval: Duration) -> String {
    let hours = interval.as_secs() / 3600;
    if hours >= 24 && hours % 24 == 0 {
        format!("{}d", hours / 24)
    } else if hours > 0 {
        format!("{hours}h")
    } else {
        format!("{}s", interval.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubsync_core::UpdateSchedule;
    use tempfile::TempDir;

    #[test]
    fn test_describe() {
        assert_eq!(describe(UpdateSchedule::Daily.interval().unwrap()), "1d");
        assert_eq!(describe(UpdateSchedule::Weekly.interval().unwrap()), "7d");
        assert_eq!(describe(Duration::from_secs(7200)), "2h");
        assert_eq!(describe(Duration::from_secs(90)), "90s");
    }

    #[test]
    fn test_bad_config_keeps_previous_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "update_schedule = [not toml").unwrap();

        let previous = Settings {
            update_schedule: UpdateSchedule::Weekly,
            ..Settings::default()
        };
        let settings = reload_settings(&path, previous);
        assert_eq!(settings.update_schedule, UpdateSchedule::Weekly);

        std::fs::write(&path, "update_schedule = \"never\"\n").unwrap();
        let settings = reload_settings(&path, settings);
        assert_eq!(settings.update_schedule, UpdateSchedule::Never);
    }

    #[tokio::test]
    async fn test_tick_survives_unopenable_database() {
        let dir = TempDir::new().unwrap();
        // A directory where the database file should be.
        let layout = HostLayout {
            db: dir.path().to_path_buf(),
            libraries: dir.path().join("libraries"),
            tmp: dir.path().join("tmp"),
        };

        let ran = tick(
            &layout,
            &Settings::default(),
            Some("http://127.0.0.1:9"),
            &Output::quiet(true),
            &CancellationToken::new(),
        )
        .await;

        assert!(!ran);
    }
}
