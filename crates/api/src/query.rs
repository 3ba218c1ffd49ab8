//! Shared query parameter types for API handlers.

use kontrol_core::types::Date;
use serde::Deserialize;

/// `?today=YYYY-MM-DD` override for schedule computations. Defaults to the
/// current UTC date.
#[derive(Debug, Deserialize)]
pub struct TodayParams {
    pub today: Option<Date>,
}

impl TodayParams {
    pub fn resolve(&self) -> Date {
        self.today
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}
