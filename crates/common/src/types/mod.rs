use serde::Serialize;

use crate::utils::time::now_iso8601;

/// Liveness probe payload returned by `GET /health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub ts: String,
}

impl Health {
    pub fn now() -> Self {
        Self { status: "ok", ts: now_iso8601() }
    }
}
