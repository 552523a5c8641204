//! # PLT trackpoint parser
//!
//! Reads line-oriented trackpoint files into [`Coordinate`] records.
//!
//! The first [`HEADER_LINES`] lines are skipped unconditionally. Every
//! following line is one trackpoint:
//!
//! ```notrust
//! latitude,longitude,<reserved>,altitude,<reserved>,YYYY-MM-DD,HH:MM:SS
//! 39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04
//! ```
//!
//! Parsing is all-or-nothing: one malformed line rejects the whole file.
//! [`Parser::parse_lenient`] is the explicitly named alternative that skips
//! malformed lines instead.

mod models;

pub use models::*;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use timestamp::{LocalZone, TimeError, TimestampCodec, UtcOffset};

/// Metadata and column legend lines at the top of every track file
pub const HEADER_LINES: usize = 6;

/// Trackpoint times carry whole seconds only
const MICROSECOND_SUFFIX: &str = ".000000";

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("cannot open track file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read track data: {0}")]
    Read(#[from] std::io::Error),

    #[error("line {line_number}: malformed trackpoint `{line}`")]
    LineFormat { line_number: usize, line: String },

    #[error("line {line_number}: bad trackpoint time in `{line}`: {source}")]
    Time {
        line_number: usize,
        line: String,
        #[source]
        source: TimeError,
    },
}

impl TrackError {
    /// 1-based line number of the offending line, if any
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::LineFormat { line_number, .. } | Self::Time { line_number, .. } => {
                Some(*line_number)
            }
            Self::Open { .. } | Self::Read(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;

/// Outcome of a lenient parse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LenientParse {
    pub coordinates: Vec<Coordinate>,
    /// 1-based line numbers of skipped lines
    pub rejected: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Parser<Z = UtcOffset> {
    codec: TimestampCodec<Z>,
    to_utc: bool,
}

impl Default for Parser<UtcOffset> {
    fn default() -> Self {
        Self::new(TimestampCodec::default())
    }
}

impl<Z: LocalZone> Parser<Z> {
    /// Parser keeping trackpoint times as local wall-clock values
    pub const fn new(codec: TimestampCodec<Z>) -> Self {
        Self {
            codec,
            to_utc: false,
        }
    }

    /// Convert trackpoint times to true UTC instants
    pub fn set_to_utc(mut self, to_utc: bool) -> Self {
        self.to_utc = to_utc;
        self
    }

    pub fn codec(&self) -> &TimestampCodec<Z> {
        &self.codec
    }

    pub fn to_utc(&self) -> bool {
        self.to_utc
    }

    /// Parse a track file
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<Vec<Coordinate>> {
        let path = path.as_ref();

        let coordinates = self.parse_reader(open(path)?)?;

        tracing::debug!(
            path = %path.display(),
            records = coordinates.len(),
            "parsed track file"
        );

        Ok(coordinates)
    }

    /// Parse track data, header included, from any buffered reader
    pub fn parse_reader(&self, reader: impl BufRead) -> Result<Vec<Coordinate>> {
        let mut coordinates = Vec::new();

        for line in data_lines(reader) {
            let (line_number, line) = line?;

            let coordinate = decode(line_number, line)
                .and_then(|line| self.parse_line(&line, line_number))
                .inspect_err(|e| {
                    tracing::error!("failed to parse trackpoint: {e}");
                })?;

            coordinates.push(coordinate);
        }

        Ok(coordinates)
    }

    /// Parse a track file, skipping malformed lines.
    ///
    /// Read failures still abort.
    pub fn parse_lenient(&self, path: impl AsRef<Path>) -> Result<LenientParse> {
        let path = path.as_ref();

        let parsed = self.parse_reader_lenient(open(path)?)?;

        tracing::debug!(
            path = %path.display(),
            records = parsed.coordinates.len(),
            rejected = parsed.rejected.len(),
            "parsed track file leniently"
        );

        Ok(parsed)
    }

    pub fn parse_reader_lenient(&self, reader: impl BufRead) -> Result<LenientParse> {
        let mut parsed = LenientParse::default();

        for line in data_lines(reader) {
            let (line_number, line) = line?;

            match decode(line_number, line).and_then(|line| self.parse_line(&line, line_number)) {
                Ok(coordinate) => parsed.coordinates.push(coordinate),
                Err(e) => {
                    tracing::warn!("skipping trackpoint: {e}");
                    parsed.rejected.push(line_number);
                }
            }
        }

        Ok(parsed)
    }

    /// Parse one data line. `line_number` is only used for diagnostics.
    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<Coordinate> {
        let malformed = || TrackError::LineFormat {
            line_number,
            line: line.to_owned(),
        };

        let tokens = line.split(',').map(str::trim).collect::<Vec<_>>();

        let [latitude, longitude, _, altitude, _, date, time] = tokens[..] else {
            return Err(malformed());
        };

        let number = |token: &str| {
            token
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(malformed)
        };

        let latitude = number(latitude)?;
        let longitude = number(longitude)?;
        let altitude = corrected_altitude(number(altitude)?);

        let datetime = format!("{date} {time}{MICROSECOND_SUFFIX}");
        let time = self
            .codec
            .parse_datetime_to_ms(&datetime, self.to_utc)
            .map_err(|source| TrackError::Time {
                line_number,
                line: line.to_owned(),
                source,
            })?;

        Ok(Coordinate {
            latitude,
            longitude,
            altitude,
            time,
        })
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TrackError::Open {
            path: path.to_owned(),
            source,
        })
}

/// Raw lines after the header with their 1-based line numbers.
///
/// Header lines are never decoded, so they may hold any bytes.
fn data_lines(reader: impl BufRead) -> impl Iterator<Item = Result<(usize, Vec<u8>)>> {
    reader
        .split(b'\n')
        .enumerate()
        .skip(HEADER_LINES)
        .map(|(i, line)| {
            let mut line = line?;

            if line.last() == Some(&b'\r') {
                line.pop();
            }

            Ok((i + 1, line))
        })
}

fn decode(line_number: usize, line: Vec<u8>) -> Result<String> {
    String::from_utf8(line).map_err(|e| TrackError::LineFormat {
        line_number,
        line: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, Read, Write};

    use approx::assert_relative_eq;
    use time::macros::{datetime, offset};

    use super::*;

    const HEADER: &str = "Geolife trajectory\n\
        WGS 84\n\
        Altitude is in Feet\n\
        Reserved 3\n\
        0,2,255,My Track,0,0,2,8421376\n\
        0\n";

    fn track(lines: &[&str]) -> String {
        let mut track = HEADER.to_owned();

        for line in lines {
            track.push_str(line);
            track.push('\n');
        }

        track
    }

    fn track_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();

        file
    }

    #[test]
    fn end_to_end_single_record() {
        let file = track_file(&track(&["39.904200,116.407400,0,50.1,0,2020-03-24,15:16:04"]));

        for to_utc in [false, true] {
            let parser = Parser::new(TimestampCodec::fixed(offset!(+8))).set_to_utc(to_utc);

            let coordinates = parser.parse(file.path()).unwrap();

            assert_eq!(coordinates.len(), 1);

            let coordinate = coordinates[0];
            assert_relative_eq!(coordinate.latitude, 39.9042);
            assert_relative_eq!(coordinate.longitude, 116.4074);
            assert_relative_eq!(coordinate.altitude, 50.1);
            assert_eq!(
                coordinate.time,
                parser
                    .codec()
                    .parse_datetime_to_ms("2020-03-24 15:16:04.000000", to_utc)
                    .unwrap()
            );
        }
    }

    #[test]
    fn to_utc_flag_selects_instant() {
        let line = "39.904200,116.407400,0,50.1,0,2020-03-24,15:16:04";
        let codec = TimestampCodec::fixed(offset!(+8));

        let local = Parser::new(codec.clone()).parse_line(line, 7).unwrap();
        let utc = Parser::new(codec).set_to_utc(true).parse_line(line, 7).unwrap();

        assert_eq!(
            local.time,
            datetime!(2020-03-24 15:16:04 UTC).unix_timestamp() as u64 * 1000
        );
        assert_eq!(
            utc.time,
            datetime!(2020-03-24 07:16:04 UTC).unix_timestamp() as u64 * 1000
        );
    }

    #[test]
    fn header_is_skipped_and_order_kept() {
        let data = track(&[
            "39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04",
            "39.984683,116.31845,0,492,39744.1202546296,2008-10-23,02:53:10",
            "39.984686,116.318417,0,492,39744.1203125,2008-10-23,02:53:15",
            "39.984688,116.318385,0,492,39744.1203703704,2008-10-23,02:53:20",
        ]);

        let coordinates = Parser::default().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(coordinates.len(), 4);
        assert_relative_eq!(coordinates[0].latitude, 39.984702);
        assert_relative_eq!(coordinates[1].longitude, 116.31845);
        assert_relative_eq!(coordinates[3].longitude, 116.318385);
        assert!(coordinates.windows(2).all(|pair| pair[0].time < pair[1].time));
        assert_eq!(coordinates[1].time - coordinates[0].time, 6000);
    }

    #[test]
    fn header_only_is_empty() {
        assert_eq!(Parser::default().parse_reader(HEADER.as_bytes()).unwrap(), vec![]);
        assert_eq!(Parser::default().parse_reader(&b"short\n"[..]).unwrap(), vec![]);
    }

    #[test]
    fn header_content_is_not_inspected() {
        let mut data = b"\xff\xfe binary\n\n\n\n\n\n".to_vec();
        data.extend_from_slice(b"1.5,2.5,0,3.5,0,2020-01-01,00:00:00\n");

        let coordinates = Parser::default().parse_reader(data.as_slice()).unwrap();

        assert_eq!(coordinates.len(), 1);
    }

    #[test]
    fn invalid_utf8_data_line() {
        let mut data = track(&["1,1,0,10,0,2020-01-01,00:00:00"]).into_bytes();
        data.extend_from_slice(b"1,1,0,10,0,2020-01-01,00:00:0\xff\n");

        let result = Parser::default().parse_reader(data.as_slice());

        assert!(matches!(result, Err(TrackError::LineFormat { line_number: 8, .. })));

        let parsed = Parser::default().parse_reader_lenient(data.as_slice()).unwrap();

        assert_eq!(parsed.coordinates.len(), 1);
        assert_eq!(parsed.rejected, vec![8]);
    }

    /// Yields nothing but an error
    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device went away"))
        }
    }

    fn interrupted_track() -> impl BufRead {
        let data = track(&["1,1,0,10,0,2020-01-01,00:00:00"]).into_bytes();

        BufReader::new(io::Cursor::new(data).chain(Unreadable))
    }

    #[test]
    fn read_failure_aborts() {
        let result = Parser::default().parse_reader(interrupted_track());

        assert!(matches!(result, Err(TrackError::Read(_))));
        assert!(result.is_err_and(|e| e.line_number().is_none()));
    }

    #[test]
    fn read_failure_aborts_lenient_too() {
        let result = Parser::default().parse_reader_lenient(interrupted_track());

        assert!(matches!(result, Err(TrackError::Read(_))));
    }

    #[test]
    fn altitude_marker() {
        let data = track(&[
            "1,1,0,777,0,2020-01-01,00:00:00",
            "1,1,0,777.0000000001,0,2020-01-01,00:00:01",
            "1,1,0,776.9,0,2020-01-01,00:00:02",
            "1,1,0,777.1,0,2020-01-01,00:00:03",
        ]);

        let altitudes = Parser::default()
            .parse_reader(data.as_bytes())
            .unwrap()
            .into_iter()
            .map(|this| this.altitude)
            .collect::<Vec<_>>();

        assert_eq!(altitudes, vec![0.0, 0.0, 776.9, 777.1]);
    }

    #[test]
    fn malformed_line_aborts_whole_parse() {
        let file = track_file(&track(&[
            "1,1,0,10,0,2020-01-01,00:00:00",
            "1,1,0,10,0,2020-01-01,00:00:01",
            "north,1,0,10,0,2020-01-01,00:00:02",
            "1,1,0,10,0,2020-01-01,00:00:03",
        ]));

        let result = Parser::default().parse(file.path());

        match result {
            Err(TrackError::LineFormat { line_number, line }) => {
                assert_eq!(line_number, 9);
                assert_eq!(line, "north,1,0,10,0,2020-01-01,00:00:02");
            }
            other => panic!("expected line format error, got {other:?}"),
        }
    }

    #[test]
    fn token_count_is_exact() {
        let parser = Parser::default();

        for line in [
            "",
            "1,1,0,10,0,2020-01-01",
            "1,1,0,10,0,2020-01-01,00:00:00,extra",
            "1;1;0;10;0;2020-01-01;00:00:00",
        ] {
            assert!(
                matches!(
                    parser.parse_line(line, 7),
                    Err(TrackError::LineFormat { .. })
                ),
                "{line:?}"
            );
        }
    }

    #[test]
    fn numeric_fields_must_be_finite() {
        let parser = Parser::default();

        for line in [
            "NaN,1,0,10,0,2020-01-01,00:00:00",
            "1,inf,0,10,0,2020-01-01,00:00:00",
            "1,1,0,,0,2020-01-01,00:00:00",
        ] {
            assert!(parser.parse_line(line, 7).is_err(), "{line:?}");
        }
    }

    #[test]
    fn reserved_fields_are_ignored() {
        let coordinate = Parser::default()
            .parse_line("1,2,x,3,y,2020-01-01,00:00:00", 7)
            .unwrap();

        assert_eq!(coordinate.altitude, 3.0);
    }

    #[test]
    fn bad_time_is_time_error() {
        let parser = Parser::default();

        let error = parser
            .parse_line("1,1,0,10,0,2020-13-01,00:00:00", 12)
            .unwrap_err();

        assert!(matches!(
            error,
            TrackError::Time {
                source: TimeError::Format { .. },
                ..
            }
        ));
        assert_eq!(error.line_number(), Some(12));
    }

    #[test]
    fn crlf_line_endings() {
        let data = track(&["1,1,0,10,0,2020-01-01,00:00:00"]).replace('\n', "\r\n");

        let coordinates = Parser::default().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(coordinates.len(), 1);
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = Parser::default().parse(dir.path().join("missing.plt"));

        assert!(matches!(result, Err(TrackError::Open { .. })));
    }

    #[test]
    fn lenient_skips_malformed_lines() {
        let file = track_file(&track(&[
            "1,1,0,10,0,2020-01-01,00:00:00",
            "garbage",
            "1,1,0,10,0,2020-02-30,00:00:02",
            "1,1,0,10,0,2020-01-01,25:00:00",
            "2,2,0,777,0,2020-01-01,00:00:03",
        ]));

        let parsed = Parser::default().parse_lenient(file.path()).unwrap();

        assert_eq!(parsed.coordinates.len(), 3);
        assert_eq!(parsed.rejected, vec![8, 10]);
        assert_eq!(parsed.coordinates[2].altitude, 0.0);
    }
}
