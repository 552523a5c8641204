//! ISO 8601 datetimes with an hour-resolution offset suffix and
//! `±hh:mm` offset strings.
//!
//! ```notrust
//! 2020-03-24T15:16:18+03
//! 2020-03-24T10:16:18-02
//! 2020-03-24T12:16:18Z
//! 2020-03-24T12:16:18
//! ```
//!
//! The suffix labels the fields, it is not applied to them: the fields go
//! through the same local conversion as [`TimestampCodec::parse_datetime_to_ms`]
//! and the suffix hour is returned alongside.

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{DateTimeFields, LocalZone, TimeError, TimestampCodec, parse_exact, unsigned_year};

const ISO_FIELDS_LEN: usize = "YYYY-MM-DDThh:mm:ss".len();

const ISO_FIELDS_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const OFFSET_HOUR_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[offset_hour sign:mandatory]");

const OFFSET_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDateTime {
    /// Epoch seconds, see [`TimestampCodec`] for the `to_utc` rule
    pub seconds: i64,
    /// Suffix hour, `0` for `Z` or no suffix
    pub offset_hours: i8,
}

impl<Z: LocalZone> TimestampCodec<Z> {
    /// Parse `YYYY-MM-DDThh:mm:ss[Z|±hh]`
    pub fn parse_iso_datetime(&self, text: &str, to_utc: bool) -> Result<IsoDateTime, TimeError> {
        let (head, suffix) = match text.get(..ISO_FIELDS_LEN) {
            Some(head) => (head, &text[ISO_FIELDS_LEN..]),
            None => return Err(TimeError::format(text, "too short")),
        };

        unsigned_year(text, 0)?;
        let parsed = parse_exact(head, ISO_FIELDS_FORMAT).map_err(|_| {
            TimeError::format(text, "expected YYYY-MM-DDThh:mm:ss")
        })?;

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
            hour: parsed
                .hour_24()
                .ok_or_else(|| TimeError::format(text, "missing hour"))?,
            minute: parsed
                .minute()
                .ok_or_else(|| TimeError::format(text, "missing minute"))?,
            second: parsed
                .second()
                .ok_or_else(|| TimeError::format(text, "missing second"))?,
            millisecond: 0,
        };
        fields.validate(text)?;

        let offset_hours = match suffix {
            "" | "Z" => 0,
            suffix => parse_exact(suffix, OFFSET_HOUR_FORMAT)
                .ok()
                .and_then(|parsed| parsed.offset_hour())
                .ok_or_else(|| TimeError::format(text, "expected Z or ±hh suffix"))?,
        };

        let seconds = self.local_to_epoch(text, &fields)?;

        Ok(IsoDateTime {
            seconds: self.shift(seconds, to_utc),
            offset_hours,
        })
    }
}

/// Render the UTC fields of epoch milliseconds followed by a `±hh` suffix
pub fn format_iso_datetime(millis: u64, offset_hours: i8) -> Result<String, TimeError> {
    let text = millis.to_string();

    let seconds = i64::try_from(millis / 1000).map_err(|e| TimeError::conversion(&text, e))?;
    let instant =
        OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| TimeError::conversion(&text, e))?;

    let fields = instant
        .format(ISO_FIELDS_FORMAT)
        .map_err(|e| TimeError::conversion(&text, e))?;
    let suffix = UtcOffset::from_hms(offset_hours, 0, 0)
        .map_err(|e| TimeError::conversion(&text, e))?
        .format(OFFSET_HOUR_FORMAT)
        .map_err(|e| TimeError::conversion(&text, e))?;

    Ok(format!("{fields}{suffix}"))
}

/// Render an offset in milliseconds as `±hh:mm`, truncating seconds
pub fn format_offset(offset_ms: i64) -> Result<String, TimeError> {
    let text = offset_ms.to_string();

    let seconds = i32::try_from(offset_ms / 60_000 * 60)
        .map_err(|e| TimeError::conversion(&text, e))?;

    UtcOffset::from_whole_seconds(seconds)
        .map_err(|e| TimeError::conversion(&text, e))?
        .format(OFFSET_FORMAT)
        .map_err(|e| TimeError::conversion(&text, e))
}

/// Parse `±hh:mm` into signed milliseconds
pub fn parse_offset(text: &str) -> Result<i64, TimeError> {
    parse_utc_offset(text).map(|offset| i64::from(offset.whole_seconds()) * 1000)
}

/// Parse `±hh:mm` into a fixed zone
pub fn parse_utc_offset(text: &str) -> Result<UtcOffset, TimeError> {
    UtcOffset::parse(text, OFFSET_FORMAT).map_err(|e| TimeError::format(text, e))
}
