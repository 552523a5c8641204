use std::io::Write;

use geodesy::Segment;
use timestamp::{LocalZone, TimeError, TimestampCodec};

/// One csv row per segment
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SegmentRecord {
    pub from: String,
    pub to: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub distance_m: f64,
    pub chord_m: f64,
    pub vertical_m: f64,
    pub duration_ms: u64,
    pub speed_kmhr: Option<f64>,
}

impl SegmentRecord {
    pub fn new<Z: LocalZone>(
        segment: &Segment,
        codec: &TimestampCodec<Z>,
        to_utc: bool,
    ) -> Result<Self, TimeError> {
        Ok(Self {
            from: codec.format_datetime(segment.from.time, to_utc)?,
            to: codec.format_datetime(segment.to.time, to_utc)?,
            latitude: segment.to.latitude,
            longitude: segment.to.longitude,
            altitude: segment.to.altitude,
            distance_m: segment.distance,
            chord_m: segment.chord,
            vertical_m: segment.vertical,
            duration_ms: segment.duration,
            speed_kmhr: segment.speed_kmhr(),
        })
    }
}

pub fn write_csv(writer: impl Write, records: &[SegmentRecord]) -> Result<(), csv::Error> {
    let mut wrt = csv::Writer::from_writer(writer);

    for record in records {
        wrt.serialize(record)?;
    }

    wrt.flush()?;

    Ok(())
}

/// Single line summary of a segment
pub fn delta_line(segment: &Segment) -> String {
    format!(
        "delta {:.2}m / {:.2}m [dAlt = {:.3}m]",
        segment.distance, segment.chord, segment.vertical
    )
}
