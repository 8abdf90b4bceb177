//! Filters understood by the archived-items listing.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use super::lenient::scalar_string;

/// The fixed set of filter names the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterName {
    Name,
    ArchivedByUser,
    BaseStore,
    FilterQuery,
    TopLevel,
    /// Carries a `from|to` token, see [`ArchiveDateRange`].
    ArchiveDate,
}

impl FilterName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "archivedByUser" => Some(Self::ArchivedByUser),
            "baseStore" => Some(Self::BaseStore),
            "filterQuery" => Some(Self::FilterQuery),
            "topLevel" => Some(Self::TopLevel),
            "archiveDate" => Some(Self::ArchiveDate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ArchivedByUser => "archivedByUser",
            Self::BaseStore => "baseStore",
            Self::FilterQuery => "filterQuery",
            Self::TopLevel => "topLevel",
            Self::ArchiveDate => "archiveDate",
        }
    }
}

/// A filter exactly as a widget sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFilter {
    pub name: String,
    pub value: String,
}

impl DataFilter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Entries without a string `name` or a scalar `value` are not filters.
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?;
        let value = scalar_string(value.get("value")?)?;
        Some(Self::new(name, value))
    }

    /// `None` for names outside [`FilterName`]; those never reach the backend.
    pub fn recognize(&self) -> Option<FilterDescriptor> {
        FilterName::parse(&self.name).map(|name| FilterDescriptor {
            name,
            value: self.value.clone(),
        })
    }
}

/// A filter whose name is known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub name: FilterName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("Not a date: {0}")]
    Unparseable(String),
    #[error("Range start {from} is not before end {to}")]
    NotBefore { from: String, to: String },
    #[error("Open-ended date ranges are not allowed")]
    OpenEnded,
}

/// The two halves of an `archiveDate` filter value (`from|to`).
///
/// Empty halves are absent; they are never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveDateRange {
    from: Option<String>,
    to: Option<String>,
}

impl ArchiveDateRange {
    pub fn parse(token: &str) -> Self {
        let mut parts = token.split('|');
        let mut part = || parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        let from = part();
        let to = part();
        Self { from, to }
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Checks the range the way the date-range form control does. The listing
    /// query only logs a failed check; callers validating form input use it directly.
    ///
    /// Both ends set: `from` must be strictly before `to`. One end set: only valid
    /// when `allow_open_end` is true. Nothing set: always valid.
    pub fn validate(&self, allow_open_end: bool) -> Result<(), DateRangeError> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                if parse_date(from)? < parse_date(to)? {
                    Ok(())
                } else {
                    Err(DateRangeError::NotBefore {
                        from: from.clone(),
                        to: to.clone(),
                    })
                }
            }
            (None, None) => Ok(()),
            _ if allow_open_end => Ok(()),
            _ => Err(DateRangeError::OpenEnded),
        }
    }
}

fn parse_date(value: &str) -> Result<i64, DateRangeError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.timestamp_millis());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .ok_or_else(|| DateRangeError::Unparseable(value.to_string()))
}
