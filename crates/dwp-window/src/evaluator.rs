use chrono::{DateTime, Local, TimeZone, Utc};

use crate::instant::{delivery_instant, DeliveryZone};
use crate::parse::{parse_delivery_date, parse_slot_start};
use crate::types::{WindowDecision, WindowPolicy, WindowReason};

/// Decide whether an order is due for promotion.
///
/// Inputs:
/// - zone: timezone the raw metadata is written in
/// - now: current instant, supplied by the caller
/// - delivery_date / time_slot: raw metadata; `None` or `""` means absent
///
/// Absent metadata is never parsed and yields `due = false`. Otherwise the
/// decision depends only on the computed delivery instant and `now`:
/// due iff `-window_secs < delivery - now <= window_secs`.
pub fn evaluate<Z: TimeZone>(
    zone: &Z,
    now: DateTime<Utc>,
    delivery_date: Option<&str>,
    time_slot: Option<&str>,
    policy: &WindowPolicy,
) -> WindowDecision {
    let Some(date_raw) = delivery_date.filter(|s| !s.is_empty()) else {
        return WindowDecision::skipped(WindowReason::MissingDeliveryDate);
    };
    let Some(slot_raw) = time_slot.filter(|s| !s.is_empty()) else {
        return WindowDecision::skipped(WindowReason::MissingTimeSlot);
    };

    let date = parse_delivery_date(date_raw);
    let start = parse_slot_start(slot_raw, &policy.fallback_slot);

    let Some(at) = delivery_instant(zone, date, start) else {
        return WindowDecision::skipped(WindowReason::UnrepresentableInstant);
    };

    let delivery_ts = at.timestamp();
    let diff_secs = delivery_ts.saturating_sub(now.timestamp());
    let due = policy.contains(diff_secs);

    WindowDecision {
        due,
        reason: if due {
            WindowReason::WithinWindow
        } else {
            WindowReason::OutsideWindow
        },
        delivery_at: Some(at.naive_local()),
        delivery_ts: Some(delivery_ts),
        diff_secs: Some(diff_secs),
    }
}

impl DeliveryZone {
    /// [`evaluate`] in this zone.
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        delivery_date: Option<&str>,
        time_slot: Option<&str>,
        policy: &WindowPolicy,
    ) -> WindowDecision {
        match self {
            DeliveryZone::Local => evaluate(&Local, now, delivery_date, time_slot, policy),
            DeliveryZone::Named(tz) => evaluate(tz, now, delivery_date, time_slot, policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn missing_date_is_not_due() {
        let p = WindowPolicy::default();
        let d = evaluate(&Utc, at(2024, 3, 14, 9, 0, 0), None, Some("09:00 - 09:30"), &p);
        assert!(!d.due);
        assert_eq!(d.reason, WindowReason::MissingDeliveryDate);
        assert_eq!(d.delivery_at, None);
    }

    #[test]
    fn empty_slot_is_not_due() {
        let p = WindowPolicy::default();
        let d = evaluate(&Utc, at(2024, 3, 14, 9, 0, 0), Some("mardi 14 mars 2024"), Some(""), &p);
        assert!(!d.due);
        assert_eq!(d.reason, WindowReason::MissingTimeSlot);
    }

    #[test]
    fn exact_start_is_due() {
        let p = WindowPolicy::default();
        let d = evaluate(
            &Utc,
            at(2024, 3, 14, 9, 0, 0),
            Some("mardi 14 mars 2024"),
            Some("09:00 - 09:30"),
            &p,
        );
        assert!(d.due);
        assert_eq!(d.diff_secs, Some(0));
        assert_eq!(d.reason, WindowReason::WithinWindow);
    }

    #[test]
    fn named_zone_shifts_the_instant() {
        let p = WindowPolicy::default();
        let paris = DeliveryZone::Named(chrono_tz::Europe::Paris);
        // 09:00 Paris (UTC+1 in March before DST) == 08:00 UTC.
        let d = paris.evaluate(
            at(2024, 3, 14, 8, 0, 0),
            Some("jeudi 14 mars 2024"),
            Some("09:00 - 09:30"),
            &p,
        );
        assert_eq!(d.diff_secs, Some(0));
        assert!(d.due);
    }

    #[test]
    fn narrower_window_is_respected() {
        let p = WindowPolicy::new(3_600, "01:00 - 01:30");
        let d = evaluate(
            &Utc,
            at(2024, 3, 14, 7, 0, 0),
            Some("jeudi 14 mars 2024"),
            Some("09:00 - 09:30"),
            &p,
        );
        assert_eq!(d.diff_secs, Some(7_200));
        assert!(!d.due);
        assert_eq!(d.reason, WindowReason::OutsideWindow);
    }
}
