use serde::Serialize;

use super::{ApiClient, ApiResponse};
use crate::errors::ClientError;
use crate::models::{
    Address, Booking, EarningsSummary, Profile, ProfileUpdate, RatingSubmission, ReportSubmission,
    ServiceRegistration, TransitionAction,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdateBody<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<&'a str>,
}

/// Typed wrappers over the backend's REST surface. Paths are fixed by the
/// server contract; every call goes through the authenticated request
/// pipeline in [`ApiClient`].
impl ApiClient {
    // GET /api/providers/bookings
    pub async fn provider_bookings(&self) -> Result<ApiResponse<Vec<Booking>>, ClientError> {
        self.get("/api/providers/bookings").await
    }

    // PUT /api/providers/bookings/{id}/status
    pub async fn update_booking_status(
        &self,
        booking_id: &str,
        action: &TransitionAction,
    ) -> Result<ApiResponse<Booking>, ClientError> {
        let body = StatusUpdateBody {
            status: action.target_status().as_str(),
            rejection_reason: action.rejection_reason(),
        };
        self.put(&format!("/api/providers/bookings/{booking_id}/status"), &body)
            .await
    }

    // PUT /api/providers/bookings/mark-all-viewed
    pub async fn mark_all_viewed(&self) -> Result<ApiResponse<serde_json::Value>, ClientError> {
        self.put("/api/providers/bookings/mark-all-viewed", &serde_json::json!({}))
            .await
    }

    // POST /api/providers/bookings/{id}/rate-customer
    pub async fn rate_customer(
        &self,
        booking_id: &str,
        rating: &RatingSubmission,
    ) -> Result<ApiResponse<Booking>, ClientError> {
        self.post(
            &format!("/api/providers/bookings/{booking_id}/rate-customer"),
            rating,
        )
        .await
    }

    // POST /api/providers/bookings/{id}/report
    pub async fn report_customer(
        &self,
        booking_id: &str,
        report: &ReportSubmission,
    ) -> Result<ApiResponse<Booking>, ClientError> {
        self.post(&format!("/api/providers/bookings/{booking_id}/report"), report)
            .await
    }

    // GET /api/bookings
    pub async fn customer_bookings(&self) -> Result<ApiResponse<Vec<Booking>>, ClientError> {
        self.get("/api/bookings").await
    }

    // GET /api/services/my-registrations
    pub async fn my_registrations(
        &self,
    ) -> Result<ApiResponse<Vec<ServiceRegistration>>, ClientError> {
        self.get("/api/services/my-registrations").await
    }

    // GET /api/earnings
    pub async fn earnings(&self) -> Result<ApiResponse<EarningsSummary>, ClientError> {
        self.get("/api/earnings").await
    }

    // GET /api/users/profile
    pub async fn profile(&self) -> Result<ApiResponse<Profile>, ClientError> {
        self.get("/api/users/profile").await
    }

    // PUT /api/users/profile
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ApiResponse<Profile>, ClientError> {
        self.put("/api/users/profile", update).await
    }

    // GET /api/users/addresses
    pub async fn addresses(&self) -> Result<ApiResponse<Vec<Address>>, ClientError> {
        self.get("/api/users/addresses").await
    }

    // DELETE /api/users/delete-account
    pub async fn delete_account(&self) -> Result<ApiResponse<serde_json::Value>, ClientError> {
        self.delete("/api/users/delete-account").await
    }
}
