use crate::wire::HealthRes;

/// Simple health service shared by every HTTP entry point.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Returns a `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "pdfshare is alive".into(),
        }
    }
}
