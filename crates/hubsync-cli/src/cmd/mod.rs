//! Command modules - one file per CLI command

pub mod catalog;
pub mod config;
pub mod list;
pub mod register;
pub mod restrict;
pub mod schedule;
pub mod sync;

use std::sync::Arc;

use anyhow::{Context, Result};
use hubsync_core::{EndpointSource, FixedEndpoint, HubClient, Settings, SettingsFile, SyncEngine};

use crate::host::{HostLayout, LocalHost};
use crate::ui::Output;

pub(crate) fn load_settings() -> Result<Settings> {
    let path = crate::config_path();
    Settings::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// `--endpoint` wins; otherwise the endpoint is re-read from `config.toml`
/// on every hub call.
pub(crate) fn endpoint_source(endpoint: Option<&str>) -> Arc<dyn EndpointSource> {
    match endpoint {
        Some(url) => Arc::new(FixedEndpoint(url.to_string())),
        None => Arc::new(SettingsFile::new(crate::config_path())),
    }
}

pub(crate) fn open_host(settings: &Settings) -> Result<LocalHost> {
    open_host_at(&HostLayout::from_home(), settings)
}

fn open_host_at(layout: &HostLayout, settings: &Settings) -> Result<LocalHost> {
    LocalHost::open(layout, settings.core_api_version).context("Failed to open library database")
}

/// An engine for one pass against the local site, holding the pass lock.
pub(crate) fn engine(
    settings: &Settings,
    endpoint: Option<&str>,
    output: &Output,
) -> Result<SyncEngine> {
    engine_at(&HostLayout::from_home(), settings, endpoint, output)
}

pub(crate) fn engine_at(
    layout: &HostLayout,
    settings: &Settings,
    endpoint: Option<&str>,
    output: &Output,
) -> Result<SyncEngine> {
    let host = open_host_at(layout, settings)?;
    let hub = HubClient::new(endpoint_source(endpoint)).context("Failed to build hub client")?;
    let ctx = host.context(Arc::new(hub), Arc::new(output.clone()));
    Ok(SyncEngine::new(ctx).with_lock(crate::lock_path()))
}
