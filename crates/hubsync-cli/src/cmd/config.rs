//! Config command - show or edit `config.toml`

use anyhow::{Context, Result, bail};
use hubsync_core::UpdateSchedule;
use hubsync_core::config::{endpoint_url, normalize_endpoint};

use crate::ui::Output;

pub fn show(endpoint: Option<&str>) -> Result<()> {
    let path = crate::config_path();
    let settings = super::load_settings()?;
    let output = Output::new();

    output.section(&format!("Settings ({})", path.display()));
    let rendered = toml::to_string_pretty(&settings).context("Failed to render settings")?;
    for line in rendered.lines() {
        println!("  {line}");
    }

    let effective = endpoint.unwrap_or(&settings.endpoint_url_base);
    println!();
    output.info(&format!("Hub URL: {}", endpoint_url(effective)));
    if endpoint.is_some() {
        output.info("Endpoint overridden by --endpoint / HUBSYNC_ENDPOINT");
    }
    Ok(())
}

pub fn set_endpoint(url: &str) -> Result<()> {
    let url = normalize_endpoint(url);
    if url.is_empty() {
        bail!("Endpoint must not be empty");
    }
    update(|settings| settings.endpoint_url_base = url.clone())?;
    Output::new().success(&format!("Endpoint set to {url}"));
    Ok(())
}

pub fn set_schedule(schedule: &str) -> Result<()> {
    let schedule: UpdateSchedule = schedule.parse()?;
    update(|settings| settings.update_schedule = schedule)?;
    Output::new().success(&format!("Update schedule set to {schedule}"));
    Ok(())
}

fn update(edit: impl FnOnce(&mut hubsync_core::Settings)) -> Result<()> {
    let path = crate::config_path();
    let mut settings = super::load_settings()?;
    edit(&mut settings);
    settings
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))
}
