//! `x-amz-date` timestamps.

use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

const ISO8601_COMPACT: &[FormatItem<'_>] = format_description!("[year][month][day]T[hour][minute][second]Z");

/// UTC timestamp in the compact ISO 8601 form SigV4 scopes are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AmzDate(OffsetDateTime);

impl AmzDate {
    pub(crate) fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parses `YYYYMMDDTHHMMSSZ`.
    pub(crate) fn parse(s: &str) -> Result<Self, time::error::Parse> {
        Ok(Self(PrimitiveDateTime::parse(s, ISO8601_COMPACT)?.assume_utc()))
    }

    /// `YYYYMMDDTHHMMSSZ`
    pub(crate) fn fmt_iso8601(&self) -> String {
        let t = self.0;
        format!(
            "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
            t.year(),
            u8::from(t.month()),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        )
    }

    /// `YYYYMMDD`
    pub(crate) fn fmt_date(&self) -> String {
        let t = self.0;
        format!("{:04}{:02}{:02}", t.year(), u8::from(t.month()), t.day())
    }
}

impl From<OffsetDateTime> for AmzDate {
    fn from(value: OffsetDateTime) -> Self {
        Self(value)
    }
}
