use serde::{Deserialize, Serialize};

/// Provider earnings summary as returned by `/api/earnings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    #[serde(default)]
    pub this_month: f64,
    #[serde(default)]
    pub today: f64,
    #[serde(default)]
    pub pending: f64,
}
