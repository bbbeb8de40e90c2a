use std::cmp::Ordering;

use chrono::{Datelike, Local, NaiveDate};

use crate::models::{Booking, BookingStatus};

/// Status buckets the booking screens filter by. `Upcoming` is the
/// composite bucket: anything still ahead of the provider (pending or
/// accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusGroup {
    #[default]
    All,
    Upcoming,
    Completed,
    Cancelled,
    Rejected,
}

impl StatusGroup {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "all" => Some(StatusGroup::All),
            "upcoming" => Some(StatusGroup::Upcoming),
            "completed" => Some(StatusGroup::Completed),
            "cancelled" => Some(StatusGroup::Cancelled),
            "rejected" => Some(StatusGroup::Rejected),
            _ => None,
        }
    }

    pub fn matches(&self, status: BookingStatus) -> bool {
        match self {
            StatusGroup::All => true,
            StatusGroup::Upcoming => {
                matches!(status, BookingStatus::Pending | BookingStatus::Accepted)
            }
            StatusGroup::Completed => status == BookingStatus::Completed,
            StatusGroup::Cancelled => status == BookingStatus::Cancelled,
            StatusGroup::Rejected => status == BookingStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    Any,
    Today,
    ThisWeek,
    ThisMonth,
}

impl DateRange {
    fn matches(&self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        let Some(date) = date else {
            // Undated bookings only survive when no date filter is active.
            return *self == DateRange::Any;
        };
        match self {
            DateRange::Any => true,
            DateRange::Today => date == today,
            DateRange::ThisWeek => {
                date.iso_week() == today.iso_week() && date.year() == today.year()
            }
            DateRange::ThisMonth => date.month() == today.month() && date.year() == today.year(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Status,
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Ascending,
    Descending,
}

/// Filter and sort state for a booking list view. [`apply`](Self::apply)
/// derives a projection without mutating the source list; the date-range
/// predicates are evaluated against the wall clock at call time.
#[derive(Debug, Clone, Default)]
pub struct BookingFilters {
    pub status: StatusGroup,
    pub date_range: DateRange,
    pub service: Option<String>,
    pub provider: Option<String>,
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
}

impl BookingFilters {
    pub fn apply(&self, bookings: &[Booking]) -> Vec<Booking> {
        self.apply_at(bookings, Local::now().date_naive())
    }

    pub fn apply_at(&self, bookings: &[Booking], today: NaiveDate) -> Vec<Booking> {
        let mut out: Vec<Booking> = bookings
            .iter()
            .filter(|b| self.status.matches(b.status))
            .filter(|b| {
                self.date_range
                    .matches(b.appointment_datetime().map(|dt| dt.date()), today)
            })
            .filter(|b| match &self.service {
                Some(service) => b.service_name.eq_ignore_ascii_case(service),
                None => true,
            })
            .filter(|b| match &self.provider {
                Some(provider) => b
                    .provider_name
                    .as_deref()
                    .map(|name| name.eq_ignore_ascii_case(provider))
                    .unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();

        out.sort_by(|a, b| self.compare(a, b));
        out
    }

    fn compare(&self, a: &Booking, b: &Booking) -> Ordering {
        let descending = self.sort_dir == SortDir::Descending;
        match self.sort_by {
            SortKey::Date => {
                // Undated bookings sort after dated ones in both directions.
                match (a.appointment_datetime(), b.appointment_datetime()) {
                    (Some(da), Some(db)) => {
                        if descending {
                            db.cmp(&da)
                        } else {
                            da.cmp(&db)
                        }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            SortKey::Status => {
                let ord = status_rank(a.status).cmp(&status_rank(b.status));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            SortKey::Provider => {
                let pa = a.provider_name.as_deref().unwrap_or("").to_ascii_lowercase();
                let pb = b.provider_name.as_deref().unwrap_or("").to_ascii_lowercase();
                let ord = pa.cmp(&pb);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

fn status_rank(status: BookingStatus) -> u8 {
    match status {
        BookingStatus::Pending => 0,
        BookingStatus::Accepted => 1,
        BookingStatus::Completed => 2,
        BookingStatus::Cancelled => 3,
        BookingStatus::Rejected => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, status: BookingStatus, date: &str) -> Booking {
        Booking {
            id: id.to_string(),
            status,
            customer_name: String::new(),
            customer_phone: String::new(),
            customer_address: String::new(),
            customer_state: String::new(),
            service_name: "Plumbing".to_string(),
            selected_service: String::new(),
            provider_name: None,
            appointment_date: date.to_string(),
            appointment_time: "10:00".to_string(),
            estimated_price: None,
            rejection_reason: None,
            cancellation_reason: None,
            report_reason: None,
            report_description: None,
            rating: None,
        }
    }

    fn all_statuses() -> Vec<Booking> {
        vec![
            booking("p", BookingStatus::Pending, "2024-03-01"),
            booking("a", BookingStatus::Accepted, "2024-03-02"),
            booking("r", BookingStatus::Rejected, "2024-03-03"),
            booking("c", BookingStatus::Completed, "2024-03-04"),
            booking("x", BookingStatus::Cancelled, "2024-03-05"),
        ]
    }

    fn ids(list: &[Booking]) -> Vec<&str> {
        list.iter().map(|b| b.id.as_str()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_upcoming_selects_exactly_pending_and_accepted() {
        let filters = BookingFilters {
            status: StatusGroup::parse("upcoming").unwrap(),
            ..Default::default()
        };
        let out = filters.apply_at(&all_statuses(), today());
        assert_eq!(ids(&out), vec!["p", "a"]);
    }

    #[test]
    fn test_sort_by_date_ascending_and_descending() {
        let list = vec![
            booking("1", BookingStatus::Pending, "2024-03-01"),
            booking("2", BookingStatus::Pending, "2024-01-10"),
            booking("3", BookingStatus::Pending, "2024-02-15"),
        ];
        let mut filters = BookingFilters::default();

        let out = filters.apply_at(&list, today());
        assert_eq!(ids(&out), vec!["2", "3", "1"]);

        filters.sort_dir = SortDir::Descending;
        let out = filters.apply_at(&list, today());
        assert_eq!(ids(&out), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_undated_bookings_sort_last_either_direction() {
        let list = vec![
            booking("undated", BookingStatus::Pending, ""),
            booking("dated", BookingStatus::Pending, "2024-03-01"),
        ];
        for dir in [SortDir::Ascending, SortDir::Descending] {
            let filters = BookingFilters {
                sort_dir: dir,
                ..Default::default()
            };
            let out = filters.apply_at(&list, today());
            assert_eq!(ids(&out), vec!["dated", "undated"]);
        }
    }

    #[test]
    fn test_projection_is_a_subset_satisfying_all_predicates() {
        let mut list = all_statuses();
        list[0].service_name = "Cleaning".to_string();
        list[1].provider_name = Some("Ravi".to_string());

        let filters = BookingFilters {
            status: StatusGroup::Upcoming,
            date_range: DateRange::ThisMonth,
            service: Some("plumbing".to_string()),
            provider: Some("ravi".to_string()),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let out = filters.apply_at(&list, today);

        for b in &out {
            assert!(filters.status.matches(b.status));
            assert!(b.service_name.eq_ignore_ascii_case("plumbing"));
            assert_eq!(b.provider_name.as_deref(), Some("Ravi"));
        }
        assert_eq!(ids(&out), vec!["a"]);
        // Source list is untouched.
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn test_date_range_today_and_week_and_month() {
        let list = vec![
            booking("today", BookingStatus::Pending, "2024-03-15"),
            booking("same-week", BookingStatus::Pending, "2024-03-11"),
            booking("same-month", BookingStatus::Pending, "2024-03-29"),
            booking("other", BookingStatus::Pending, "2024-04-02"),
        ];

        let base = BookingFilters::default();
        let cases = [
            (DateRange::Today, vec!["today"]),
            (DateRange::ThisWeek, vec!["same-week", "today"]),
            (DateRange::ThisMonth, vec!["same-week", "today", "same-month"]),
        ];
        for (range, expected) in cases {
            let filters = BookingFilters {
                date_range: range,
                ..base.clone()
            };
            let out = filters.apply_at(&list, today());
            assert_eq!(ids(&out), expected, "range {range:?}");
        }
    }

    #[test]
    fn test_sort_by_status_follows_lifecycle_order() {
        let filters = BookingFilters {
            sort_by: SortKey::Status,
            ..Default::default()
        };
        let out = filters.apply_at(&all_statuses(), today());
        assert_eq!(ids(&out), vec!["p", "a", "c", "x", "r"]);
    }

    #[test]
    fn test_unknown_status_label() {
        assert_eq!(StatusGroup::parse("finished"), None);
        assert_eq!(StatusGroup::parse(" Upcoming "), Some(StatusGroup::Upcoming));
    }
}
