use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A scheduled service engagement between a customer and a provider.
///
/// The status lifecycle is owned by the server; the client only requests
/// transitions and re-derives state from fetches. Date and time arrive as
/// strings and are parsed leniently — unparseable values degrade to `None`
/// instead of failing the whole list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_state: String,
    #[serde(default)]
    pub service_name: String,
    /// Comma-separated sub-service ids selected at booking time.
    #[serde(default)]
    pub selected_service: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub appointment_time: String,
    #[serde(default)]
    pub estimated_price: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub report_reason: Option<String>,
    #[serde(default)]
    pub report_description: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "accepted" => BookingStatus::Accepted,
            "rejected" => BookingStatus::Rejected,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

impl Booking {
    /// Combined appointment date and time, if the date is parseable.
    /// A missing or unparseable time falls back to midnight so date-only
    /// bookings still sort and filter by day.
    pub fn appointment_datetime(&self) -> Option<NaiveDateTime> {
        let date = parse_date_lenient(&self.appointment_date)?;
        let time = parse_time_lenient(&self.appointment_time)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
        Some(date.and_time(time))
    }

    pub fn sub_service_ids(&self) -> Vec<&str> {
        self.selected_service
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// City-level location for display and grouping: the customer state
    /// when present, otherwise derived from the free-form address.
    pub fn location(&self) -> Option<String> {
        let state = self.customer_state.trim();
        if !state.is_empty() {
            return Some(state.to_string());
        }
        derive_location(&self.customer_address)
    }
}

/// A status transition the client may request. The server owns the
/// lifecycle; these only name the request being made.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionAction {
    Accept,
    Reject { reason: Option<String> },
    Complete,
}

impl TransitionAction {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            TransitionAction::Accept => BookingStatus::Accepted,
            TransitionAction::Reject { .. } => BookingStatus::Rejected,
            TransitionAction::Complete => BookingStatus::Completed,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            TransitionAction::Reject { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Pick a city-like segment out of a free-form comma-separated address:
/// the last segment that is neither pincode-like (digit-dominated) nor a
/// street-type segment ("12 Oak Lane", "MG Road").
pub fn derive_location(address: &str) -> Option<String> {
    address
        .rsplit(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .find(|s| !is_pincode_like(s) && !is_street_segment(s))
        .map(|s| s.to_string())
}

fn is_pincode_like(segment: &str) -> bool {
    let digits = segment.chars().filter(|c| c.is_ascii_digit()).count();
    let alpha = segment.chars().filter(|c| c.is_alphabetic()).count();
    digits >= 4 && digits > alpha
}

const STREET_SUFFIXES: &[&str] = &[
    "lane", "ln", "road", "rd", "street", "st", "avenue", "ave", "drive", "dr", "blvd",
    "boulevard", "cross", "layout", "marg",
];

fn is_street_segment(segment: &str) -> bool {
    segment
        .split_whitespace()
        .last()
        .map(|word| {
            let word = word.trim_end_matches('.').to_ascii_lowercase();
            STREET_SUFFIXES.contains(&word.as_str())
        })
        .unwrap_or(false)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Full timestamps (RFC 3339 or "YYYY-MM-DD HH:MM:SS") carry the date up front.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub fn parse_time_lenient(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let upper = raw.to_ascii_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&upper, fmt).ok())
}
