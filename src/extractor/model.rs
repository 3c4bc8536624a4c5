use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Structured event fields. Every field is independently optional; a key
/// the model left out reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Start of the event, ISO 8601 as returned by the model.
    pub date: Option<String>,
    /// Venue name.
    pub place: Option<String>,
    /// Street address without the venue name.
    pub address: Option<String>,
}

/// A parsed `EventDetails::date`, as precise as the model's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    Zoned(DateTime<FixedOffset>),
    Local(NaiveDateTime),
    Day(NaiveDate),
}

impl EventDetails {
    /// Trim every field and turn blank strings into `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: non_blank(self.title),
            description: non_blank(self.description),
            date: non_blank(self.date),
            place: non_blank(self.place),
            address: non_blank(self.address),
        }
    }

    /// Parse `date` leniently. Unparseable values yield `None`.
    pub fn start_date(&self) -> Option<EventDate> {
        let raw = self.date.as_deref()?.trim();

        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Some(EventDate::Zoned(zoned));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(local) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(EventDate::Local(local));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(EventDate::Day)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.place.is_none()
            && self.address.is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
