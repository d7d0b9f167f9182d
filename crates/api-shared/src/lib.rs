//! # API Shared
//!
//! Shared utilities and definitions for the pdfshare HTTP API.
//!
//! Contains:
//! - Wire types (`wire` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Identity header parsing
//!
//! Used by `api-rest` and the workspace's `pdfshare-run` binary.

pub mod auth;
pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
