//! # Timestamp codec
//!
//! Converts trackpoint date/time strings into absolute millisecond
//! timestamps and back.
//!
//! Input layout:
//!
//! ```notrust
//! YYYY-MM-DD HH:MM:SS.ffffff
//! 2020-03-24 15:16:04.930000
//! ```
//!
//! The microsecond fraction is truncated to milliseconds.
//!
//! The broken-down fields are read as a wall-clock time in a [`LocalZone`]
//! and converted to epoch seconds. With `to_utc == false` the codec adds the
//! zone's current offset on top of that result:
//!
//! ```notrust
//! millis = (local_to_epoch(fields) [+ reference_offset if !to_utc]) * 1000 + ms
//! ```
//!
//! For a fixed-offset zone `to_utc == false` therefore yields the fields read
//! as if they were UTC, while `to_utc == true` yields the true instant.
//!
//! The zone is an explicit parameter. Use [`SystemZone`] for the operating
//! system zone, or a [`UtcOffset`] for a fixed one.

mod iso;
mod zone;

pub use iso::*;
pub use time::UtcOffset;
pub use zone::*;

use time::{
    Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::BorrowedFormatItem, macros::format_description, parsing::Parsed,
};

/// Accepted years are `MIN_YEAR..MAX_YEAR`
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 3000;

/// 3000-01-01T00:00:00Z
const MAX_EPOCH_SECONDS: i64 = 32_503_680_000;
const SECONDS_PER_DAY: i64 = 86_400;

const DATETIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

const VERIFY_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day].[month].[year]");

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const VERIFY_DATE_YEAR_AT: usize = "DD.MM.".len();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("malformed datetime `{text}`: {reason}")]
    Format { text: String, reason: String },

    #[error("cannot convert `{text}` to epoch time: {reason}")]
    Conversion { text: String, reason: String },

    #[error("local zone offset is unavailable")]
    ZoneUnavailable,
}

impl TimeError {
    pub(crate) fn format(text: &str, reason: impl ToString) -> Self {
        Self::Format {
            text: text.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn conversion(text: &str, reason: impl ToString) -> Self {
        Self::Conversion {
            text: text.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Broken-down date and time as written in a track file.
///
/// `day` is range checked only (`1..=31`), not against the month length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeFields {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl DateTimeFields {
    /// Decompose `YYYY-MM-DD HH:MM:SS.ffffff`
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        unsigned_year(text, 0)?;
        let parsed = parse_exact(text, DATETIME_FORMAT)?;

        let subsecond = parsed
            .subsecond()
            .ok_or_else(|| TimeError::format(text, "missing fraction"))?;

        let fields = Self {
            year: parsed
                .year()
                .ok_or_else(|| TimeError::format(text, "missing year"))?,
            month: parsed
                .month()
                .map(u8::from)
                .ok_or_else(|| TimeError::format(text, "missing month"))?,
            day: parsed
                .day()
                .map(|day| day.get())
                .ok_or_else(|| TimeError::format(text, "missing day"))?,
            hour: parsed
                .hour_24()
                .ok_or_else(|| TimeError::format(text, "missing hour"))?,
            minute: parsed
                .minute()
                .ok_or_else(|| TimeError::format(text, "missing minute"))?,
            second: parsed
                .second()
                .ok_or_else(|| TimeError::format(text, "missing second"))?,
            millisecond: u16::try_from(subsecond / 1_000_000)
                .map_err(|_| TimeError::format(text, "fraction out of range"))?,
        };

        fields.validate(text)?;

        Ok(fields)
    }

    fn validate(&self, text: &str) -> Result<(), TimeError> {
        if !(MIN_YEAR..MAX_YEAR).contains(&self.year) {
            return Err(TimeError::format(
                text,
                format!("year {} outside {MIN_YEAR}..{MAX_YEAR}", self.year),
            ));
        }

        let checks = [
            ("month", self.month, 1..=12),
            ("day", self.day, 1..=31),
            ("hour", self.hour, 0..=23),
            ("minute", self.minute, 0..=59),
            ("second", self.second, 0..=59),
        ];

        for (name, value, range) in checks {
            if !range.contains(&value) {
                return Err(TimeError::format(
                    text,
                    format!("{name} {value} out of range"),
                ));
            }
        }

        Ok(())
    }

    /// Local wall-clock time of the fields.
    ///
    /// Days past the end of the month roll over into the next month,
    /// e.g. `2021-02-31` is `2021-03-03`.
    pub fn wall_clock(&self) -> Option<PrimitiveDateTime> {
        let month = Month::try_from(self.month).ok()?;
        let date = Date::from_calendar_date(self.year, month, 1)
            .ok()?
            .checked_add(Duration::days(i64::from(self.day) - 1))?;
        let time = Time::from_hms(self.hour, self.minute, self.second).ok()?;

        Some(PrimitiveDateTime::new(date, time))
    }
}

/// Codec bound to a local zone.
///
/// The reference offset is the zone's offset "now", captured once when the
/// codec is built and reused by every conversion with `to_utc == false`.
#[derive(Debug, Clone)]
pub struct TimestampCodec<Z = UtcOffset> {
    zone: Z,
    reference_offset: UtcOffset,
}

impl TimestampCodec<UtcOffset> {
    /// Fixed-offset zone
    pub const fn fixed(offset: UtcOffset) -> Self {
        Self {
            zone: offset,
            reference_offset: offset,
        }
    }

    pub const fn utc() -> Self {
        Self::fixed(UtcOffset::UTC)
    }
}

impl Default for TimestampCodec<UtcOffset> {
    fn default() -> Self {
        Self::utc()
    }
}

impl<Z: LocalZone> TimestampCodec<Z> {
    /// Build a codec capturing the zone's current offset.
    pub fn new(zone: Z) -> Result<Self, TimeError> {
        let reference_offset = zone
            .offset_at_utc(OffsetDateTime::now_utc())
            .ok_or(TimeError::ZoneUnavailable)?;

        Ok(Self {
            zone,
            reference_offset,
        })
    }

    /// Build a codec with an explicit reference offset instead of "now".
    pub const fn with_reference_offset(zone: Z, reference_offset: UtcOffset) -> Self {
        Self {
            zone,
            reference_offset,
        }
    }

    pub fn zone(&self) -> &Z {
        &self.zone
    }

    /// Signed offset in seconds, positive east of UTC
    pub fn reference_offset_seconds(&self) -> i32 {
        self.reference_offset.whole_seconds()
    }

    /// Convert `YYYY-MM-DD HH:MM:SS.ffffff` into epoch milliseconds
    pub fn parse_datetime_to_ms(&self, text: &str, to_utc: bool) -> Result<u64, TimeError> {
        let fields = DateTimeFields::parse(text)?;
        let seconds = self.local_to_epoch(text, &fields)?;

        self.compose(text, seconds, to_utc, fields.millisecond)
    }

    /// Convert a `DD.MM.YYYY` date at local midnight into epoch milliseconds
    pub fn parse_verify_date_to_ms(&self, text: &str, to_utc: bool) -> Result<u64, TimeError> {
        unsigned_year(text, VERIFY_DATE_YEAR_AT)?;
        let parsed = parse_exact(text, VERIFY_DATE_FORMAT)?;

        let fields = DateTimeFields {
            year: parsed
                .year()
                .ok_or_else(|| TimeError::format(text, "missing year"))?,
            month: parsed
                .month()
                .map(u8::from)
                .ok_or_else(|| TimeError::format(text, "missing month"))?,
            day: parsed
                .day()
                .map(|day| day.get())
                .ok_or_else(|| TimeError::format(text, "missing day"))?,
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
        };
        fields.validate(text)?;

        let seconds = self.local_to_epoch(text, &fields)?;

        self.compose(text, seconds, to_utc, 0)
    }

    /// Render epoch milliseconds as `YYYY-MM-DD HH:MM:SS.ffffff`.
    ///
    /// Inverse of [`Self::parse_datetime_to_ms`] with the same `to_utc` flag.
    pub fn format_datetime(&self, millis: u64, to_utc: bool) -> Result<String, TimeError> {
        let wall_clock = self.epoch_to_wall_clock(millis, to_utc)?;

        wall_clock
            .format(DATETIME_FORMAT)
            .map_err(|e| TimeError::conversion(&millis.to_string(), e))
    }

    /// Epoch seconds of the fields read as local wall-clock time
    pub(crate) fn local_to_epoch(
        &self,
        text: &str,
        fields: &DateTimeFields,
    ) -> Result<i64, TimeError> {
        let wall_clock = fields
            .wall_clock()
            .ok_or_else(|| TimeError::conversion(text, "fields do not form a calendar date"))?;

        let offset = self
            .zone
            .offset_at_local(wall_clock)
            .ok_or_else(|| TimeError::conversion(text, "local time does not exist in zone"))?;

        Ok(wall_clock.assume_offset(offset).unix_timestamp())
    }

    /// Apply the `to_utc` rule to epoch seconds.
    pub(crate) fn shift(&self, seconds: i64, to_utc: bool) -> i64 {
        match to_utc {
            true => seconds,
            false => seconds + i64::from(self.reference_offset.whole_seconds()),
        }
    }

    fn compose(
        &self,
        text: &str,
        seconds: i64,
        to_utc: bool,
        millisecond: u16,
    ) -> Result<u64, TimeError> {
        let seconds = u64::try_from(self.shift(seconds, to_utc))
            .map_err(|_| TimeError::conversion(text, "timestamp precedes the Unix epoch"))?;

        Ok(seconds * 1000 + u64::from(millisecond))
    }

    fn epoch_to_wall_clock(
        &self,
        millis: u64,
        to_utc: bool,
    ) -> Result<PrimitiveDateTime, TimeError> {
        let text = millis.to_string();

        let seconds = i64::try_from(millis / 1000)
            .ok()
            .filter(|seconds| *seconds <= MAX_EPOCH_SECONDS + SECONDS_PER_DAY)
            .ok_or_else(|| TimeError::conversion(&text, format!("beyond year {MAX_YEAR}")))?;

        let seconds = match to_utc {
            true => seconds,
            false => seconds - i64::from(self.reference_offset.whole_seconds()),
        };

        let instant = OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|e| TimeError::conversion(&text, e))?
            + Duration::milliseconds((millis % 1000) as i64);

        let offset = self
            .zone
            .offset_at_utc(instant)
            .ok_or(TimeError::ZoneUnavailable)?;
        let local = instant.to_offset(offset);

        Ok(PrimitiveDateTime::new(local.date(), local.time()))
    }
}

/// UTC calendar day of epoch milliseconds as `YYYY-MM-DD`
pub fn format_date(millis: u64) -> Result<String, TimeError> {
    let text = millis.to_string();

    let seconds = i64::try_from(millis / 1000).map_err(|e| TimeError::conversion(&text, e))?;

    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| TimeError::conversion(&text, e))?
        .date()
        .format(DATE_FORMAT)
        .map_err(|e| TimeError::conversion(&text, e))
}

/// `[year]` accepts a leading sign, the layouts here do not
pub(crate) fn unsigned_year(text: &str, at: usize) -> Result<(), TimeError> {
    match text.as_bytes().get(at) {
        Some(byte) if byte.is_ascii_digit() => Ok(()),
        _ => Err(TimeError::format(text, "expected a four digit year")),
    }
}

/// Parse `text` against `items`, rejecting trailing input
pub(crate) fn parse_exact(
    text: &str,
    items: &[BorrowedFormatItem<'_>],
) -> Result<Parsed, TimeError> {
    let mut parsed = Parsed::new();

    let rest = parsed
        .parse_items(text.as_bytes(), items)
        .map_err(|e| TimeError::format(text, e))?;

    if !rest.is_empty() {
        return Err(TimeError::format(text, "unexpected trailing characters"));
    }

    Ok(parsed)
}
