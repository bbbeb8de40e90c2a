pub mod booking;
pub mod earnings;
pub mod profile;
pub mod service;

pub use booking::{derive_location, Booking, BookingStatus, TransitionAction};
pub use earnings::EarningsSummary;
pub use profile::{Address, Profile, ProfileUpdate};
pub use service::{RatingSubmission, ReportSubmission, ServiceRegistration};
