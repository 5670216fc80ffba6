//! Delivery instant construction.
//!
//! The delivery instant is midnight of the parsed date plus the slot start,
//! read as wall-clock time in the zone the host stores its metadata in.
//! Out-of-range fields are normalised the way a calendar would: day 32 rolls
//! into the next month, day 0 is the last day of the previous month, hour 25
//! is 01:00 on the following day.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::types::{DeliveryDate, SlotStart};

// ---------------------------------------------------------------------------
// DeliveryZone
// ---------------------------------------------------------------------------

/// Zone in which delivery metadata is interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DeliveryZone {
    /// Ambient timezone of the host process.
    #[default]
    Local,
    /// Explicit IANA zone, e.g. `Europe/Paris`.
    Named(Tz),
}

impl DeliveryZone {
    pub fn name(&self) -> String {
        match self {
            DeliveryZone::Local => "local".to_string(),
            DeliveryZone::Named(tz) => tz.name().to_string(),
        }
    }
}

/// Returned when a zone string is neither `local` nor a known IANA name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneParseError(pub String);

impl std::fmt::Display for ZoneParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown timezone '{}': expected 'local' or an IANA name", self.0)
    }
}

impl std::error::Error for ZoneParseError {}

impl FromStr for DeliveryZone {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("local") {
            return Ok(DeliveryZone::Local);
        }
        t.parse::<Tz>()
            .map(DeliveryZone::Named)
            .map_err(|_| ZoneParseError(t.to_string()))
    }
}

impl std::fmt::Display for DeliveryZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the delivery instant for `date` + `start` in `zone`.
///
/// Returns `None` only when the normalised date cannot be represented
/// (year outside chrono's range, or arithmetic overflow from absurd fields).
///
/// DST handling:
/// - an ambiguous wall-clock time (autumn fold) resolves to the earliest instant
/// - a non-existent wall-clock time (spring gap) is read with the offset in
///   force before the gap, which pushes it forward by the gap length
///   (02:30 becomes 03:30 across a one-hour gap, 02:15 becomes 02:45 across
///   a 30-minute one)
pub fn delivery_instant<Z: TimeZone>(
    zone: &Z,
    date: DeliveryDate,
    start: SlotStart,
) -> Option<DateTime<Z>> {
    let naive = naive_delivery_instant(date, start)?;
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| across_gap(zone, naive))
}

fn across_gap<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Option<DateTime<Z>> {
    let day_before = naive.checked_sub_signed(TimeDelta::try_days(1)?)?;
    let before = zone.offset_from_local_datetime(&day_before).earliest()?.fix();
    let utc = naive.checked_sub_signed(TimeDelta::try_seconds(i64::from(before.local_minus_utc()))?)?;
    Some(zone.from_utc_datetime(&utc))
}

/// Wall-clock delivery instant with calendar normalisation applied.
pub(crate) fn naive_delivery_instant(date: DeliveryDate, start: SlotStart) -> Option<NaiveDateTime> {
    let year = i32::try_from(date.year).ok()?;
    let first_of_month = NaiveDate::from_ymd_opt(year, date.month, 1)?;
    let midnight = first_of_month.and_hms_opt(0, 0, 0)?;

    let offset_secs = date
        .day
        .checked_sub(1)?
        .checked_mul(86_400)?
        .checked_add(start.hour.checked_mul(3_600)?)?
        .checked_add(start.minute.checked_mul(60)?)?;

    midnight.checked_add_signed(TimeDelta::try_seconds(offset_secs)?)
}
