//! Lenient parsing of delivery-date and time-slot metadata.

use crate::month::resolve_french_month;
use crate::types::{DeliveryDate, SlotStart};

/// Parse the leading integer of `s`, decaying to 0 when there is none.
///
/// Rules:
/// - leading ASCII whitespace is skipped
/// - one optional `+` or `-` sign
/// - then as many ASCII digits as are present; the rest is ignored
/// - no digits at all => 0
/// - values beyond `i64` saturate
pub fn lenient_int(s: &str) -> i64 {
    let t = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };

    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        acc = match acc.checked_mul(10).and_then(|v| {
            if negative {
                v.checked_sub(d)
            } else {
                v.checked_add(d)
            }
        }) {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }
    acc
}

/// Parse `"<weekday> <day> <french-month> <year>"`, e.g. `"mardi 14 mars 2024"`.
///
/// The string is split on single spaces; token 1 is the day, token 2 the
/// month name, token 3 the year. Extra tokens are ignored and missing ones
/// behave as empty strings. Day and year are not range-checked here.
pub fn parse_delivery_date(raw: &str) -> DeliveryDate {
    let tokens: Vec<&str> = raw.split(' ').collect();
    let token = |idx: usize| tokens.get(idx).copied().unwrap_or("");

    DeliveryDate {
        day: lenient_int(token(1)),
        month: resolve_french_month(token(2)),
        year: lenient_int(token(3)),
    }
}

/// Extract the start `(hour, minute)` of a time slot such as `"09:00 - 09:30"`.
///
/// A slot without any `-` is an "as soon as possible" marker; the start of
/// `fallback` is used instead. Hour and minute are lenient-parsed and not
/// range-checked.
pub fn parse_slot_start(raw: &str, fallback: &str) -> SlotStart {
    let range = if raw.contains('-') { raw } else { fallback };
    let start = range.split(" - ").next().unwrap_or("");

    let mut hm = start.split(':');
    let hour = lenient_int(hm.next().unwrap_or(""));
    let minute = lenient_int(hm.next().unwrap_or(""));
    SlotStart { hour, minute }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ASAP_FALLBACK_SLOT;

    #[test]
    fn lenient_int_reads_leading_digits() {
        assert_eq!(lenient_int("14"), 14);
        assert_eq!(lenient_int("01"), 1);
        assert_eq!(lenient_int("  7"), 7);
        assert_eq!(lenient_int("2024abc"), 2024);
        assert_eq!(lenient_int("-5"), -5);
        assert_eq!(lenient_int("+9"), 9);
    }

    #[test]
    fn lenient_int_decays_to_zero() {
        assert_eq!(lenient_int(""), 0);
        assert_eq!(lenient_int("abc"), 0);
        assert_eq!(lenient_int("x14"), 0);
        assert_eq!(lenient_int("-"), 0);
        assert_eq!(lenient_int("1er"), 1);
    }

    #[test]
    fn lenient_int_saturates() {
        assert_eq!(lenient_int("99999999999999999999999"), i64::MAX);
        assert_eq!(lenient_int("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn date_with_extra_tokens_ignores_them() {
        let d = parse_delivery_date("vendredi 5 juillet 2024 (matin)");
        assert_eq!(d, DeliveryDate::new(2024, 7, 5));
    }

    #[test]
    fn short_date_degrades_instead_of_failing() {
        assert_eq!(parse_delivery_date("mardi 14"), DeliveryDate::new(0, 1, 14));
        assert_eq!(parse_delivery_date(""), DeliveryDate::new(0, 1, 0));
    }

    #[test]
    fn double_space_shifts_tokens() {
        // Splitting is on single spaces, so an empty token appears at index 1.
        let d = parse_delivery_date("mardi  14 mars 2024");
        assert_eq!(d, DeliveryDate::new(0, 1, 0));
    }

    #[test]
    fn slot_without_spaced_separator_still_reads_hour() {
        // Contains '-' but not " - ": the whole string is the start segment.
        let s = parse_slot_start("09:00-09:30", ASAP_FALLBACK_SLOT);
        assert_eq!(s, SlotStart::new(9, 0));
    }

    #[test]
    fn non_numeric_slot_with_hyphen_decays_to_midnight() {
        let s = parse_slot_start("Livraison express - rapide", ASAP_FALLBACK_SLOT);
        assert_eq!(s, SlotStart::new(0, 0));
    }

    #[test]
    fn custom_fallback_is_honoured() {
        let s = parse_slot_start("Dès que possible", "07:45 - 08:15");
        assert_eq!(s, SlotStart::new(7, 45));
    }
}
