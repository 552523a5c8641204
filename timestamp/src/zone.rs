use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Source of UTC offsets for local wall-clock conversions.
pub trait LocalZone {
    /// Offset in effect at `instant`, or `None` if it can't be determined
    fn offset_at_utc(&self, instant: OffsetDateTime) -> Option<UtcOffset>;

    /// Offset in effect at a local wall-clock time.
    ///
    /// Returns `None` for wall-clock times skipped by a transition.
    /// Ambiguous times (repeated by a transition) resolve to the offset
    /// in effect before the transition.
    fn offset_at_local(&self, wall_clock: PrimitiveDateTime) -> Option<UtcOffset> {
        let probe = wall_clock.assume_utc();

        let before = self.offset_at_utc(probe - Duration::DAY)?;
        let after = self.offset_at_utc(probe + Duration::DAY)?;

        [before, after].into_iter().find(|offset| {
            self.offset_at_utc(wall_clock.assume_offset(*offset)) == Some(*offset)
        })
    }
}

impl LocalZone for UtcOffset {
    fn offset_at_utc(&self, _: OffsetDateTime) -> Option<UtcOffset> {
        Some(*self)
    }

    fn offset_at_local(&self, _: PrimitiveDateTime) -> Option<UtcOffset> {
        Some(*self)
    }
}

impl<Z: LocalZone + ?Sized> LocalZone for &Z {
    fn offset_at_utc(&self, instant: OffsetDateTime) -> Option<UtcOffset> {
        (**self).offset_at_utc(instant)
    }

    fn offset_at_local(&self, wall_clock: PrimitiveDateTime) -> Option<UtcOffset> {
        (**self).offset_at_local(wall_clock)
    }
}

/// Operating system time zone.
///
/// _Note_: on some platforms the offset can only be read while the process
/// is single-threaded; build the codec before spawning threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemZone;

impl LocalZone for SystemZone {
    fn offset_at_utc(&self, instant: OffsetDateTime) -> Option<UtcOffset> {
        UtcOffset::local_offset_at(instant).ok()
    }
}
