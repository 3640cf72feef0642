// Scan progress payload

use serde::Serialize;

/// Progress reported after each file of a scan is handled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub current: u64,
    pub total: u64,
    pub percent: f64,
    pub path: String,
}

impl ScanProgress {
    pub fn new(current: u64, total: u64, path: impl Into<String>) -> Self {
        let total_safe = total.max(1);
        let percent = (current as f64 / total_safe as f64) * 100.0;
        Self {
            current,
            total,
            percent: percent.min(100.0),
            path: path.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.total
    }
}
