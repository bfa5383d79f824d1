//! Sync command - one on-demand pass

use anyhow::{Result, bail};

use crate::ui::Output;

pub async fn sync(endpoint: Option<&str>, quiet: bool) -> Result<()> {
    let output = Output::quiet(quiet);
    let settings = super::load_settings()?;

    let report = super::engine(&settings, endpoint, &output)?
        .run_sync_pass()
        .await?;

    let failed = report.failed().count();
    if failed > 0 {
        bail!(
            "{failed} content type update{} failed",
            if failed == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
