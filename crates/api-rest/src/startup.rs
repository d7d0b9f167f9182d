//! Startup configuration.
//!
//! Reads the process environment once and produces the values the router needs. Nothing
//! here runs during request handling.

use crate::AppState;
use pdfshare_core::constants::{DEFAULT_DATA_DIR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PUBLIC_ORIGIN};
use pdfshare_core::{CoreConfig, OrphanPolicy, ShareServices};
use pdfshare_notify::{NotificationDispatcher, SmtpConfig, SmtpDispatcher, UnconfiguredDispatcher};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Listen address from `PDFSHARE_REST_ADDR`.
pub fn rest_addr_from_env() -> String {
    std::env::var("PDFSHARE_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into())
}

/// Builds a [`CoreConfig`] from `PDFSHARE_*` variables.
///
/// # Environment Variables
/// - `PDFSHARE_DATA_DIR`: data root, must exist (default: `pdfshare_data`)
/// - `PDFSHARE_PUBLIC_ORIGIN`: origin for links (default: `http://localhost:3000`)
/// - `PDFSHARE_MAX_UPLOAD_BYTES`: upload ceiling (default: 25 MiB)
/// - `PDFSHARE_ORPHAN_POLICY`: `keep` or `compensate` (default: `keep`)
pub fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = std::env::var("PDFSHARE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let data_path = PathBuf::from(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }

    let origin =
        std::env::var("PDFSHARE_PUBLIC_ORIGIN").unwrap_or_else(|_| DEFAULT_PUBLIC_ORIGIN.into());

    let max_upload_bytes = match std::env::var("PDFSHARE_MAX_UPLOAD_BYTES") {
        Ok(raw) => raw.trim().parse::<usize>().map_err(|e| {
            anyhow::anyhow!("PDFSHARE_MAX_UPLOAD_BYTES '{}' is not a byte count: {}", raw, e)
        })?,
        Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
    };

    let orphan_policy = match std::env::var("PDFSHARE_ORPHAN_POLICY") {
        Ok(raw) => raw.parse::<OrphanPolicy>()?,
        Err(_) => OrphanPolicy::default(),
    };

    Ok(CoreConfig::new(
        data_path,
        &origin,
        max_upload_bytes,
        orphan_policy,
    )?)
}

/// SMTP dispatcher from `SMTP_*` variables, or [`UnconfiguredDispatcher`] without `SMTP_HOST`.
pub fn dispatcher_from_env() -> anyhow::Result<Arc<dyn NotificationDispatcher>> {
    match SmtpConfig::from_lookup(|key| std::env::var(key).ok())? {
        Some(cfg) => {
            tracing::info!("email delivery via {}:{}", cfg.host, cfg.port);
            Ok(Arc::new(SmtpDispatcher::new(&cfg)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, share invites will not be delivered");
            Ok(Arc::new(UnconfiguredDispatcher))
        }
    }
}

/// Resolves configuration and wires every service.
pub fn app_state_from_env() -> anyhow::Result<AppState> {
    let cfg = core_config_from_env()?;
    let dispatcher = dispatcher_from_env()?;
    let services = ShareServices::from_config(&cfg, dispatcher.clone())?;
    Ok(AppState::new(services, dispatcher, cfg.max_upload_bytes()))
}
