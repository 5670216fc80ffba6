//! Request and response types for dwp-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use dwp_runtime::PassReport;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/passes/*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastPassResponse {
    /// `None` until the first pass completes.
    pub report: Option<PassReport>,
}

/// Body returned when a manual pass is refused or fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassErrorResponse {
    /// Grep-able code, e.g. `PASS_ALREADY_RUNNING`.
    pub error: String,
    pub detail: Option<String>,
}
