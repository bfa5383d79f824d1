//! Catalog command - what the hub offers and what a pass would do with it

use std::sync::Arc;

use anyhow::{Context, Result};
use hubsync_core::{Decision, HubClient, SyncEngine};

use crate::ui::Output;

/// Fetch the catalog and plan every entry without installing anything.
pub async fn catalog(endpoint: Option<&str>, quiet: bool) -> Result<()> {
    let output = Output::quiet(quiet);
    let settings = super::load_settings()?;
    let host = super::open_host(&settings)?;

    let hub = Arc::new(
        HubClient::new(super::endpoint_source(endpoint)).context("Failed to build hub client")?,
    );
    let site_identifier = uuid::Uuid::new_v4().to_string();
    let catalog = hub
        .fetch_catalog(&site_identifier)
        .await
        .context("Failed to fetch content type catalog")?;

    let engine = SyncEngine::new(host.context(hub, Arc::new(output.clone())));

    output.section("Content types offered by the hub");
    let mut updates = 0;
    for entry in &catalog.content_types {
        let note = match engine.plan(entry) {
            Decision::Update { installed, .. } => {
                updates += 1;
                format!("update available (installed {installed})")
            }
            Decision::Skip(reason) => reason.to_string(),
        };
        output.row(&entry.id, &entry.version.to_string(), &note);
    }

    output.info(&format!(
        "{} content types offered, {updates} would be updated",
        catalog.len()
    ));
    Ok(())
}
