use serde::{Deserialize, Serialize};

/// A service category the provider has registered for, from
/// `/api/services/my-registrations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_services: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

/// Body for POST `/api/providers/bookings/{id}/rate-customer`.
#[derive(Debug, Clone, Serialize)]
pub struct RatingSubmission {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

/// Body for POST `/api/providers/bookings/{id}/report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSubmission {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
