use chrono::NaiveDateTime;

/// Time range substituted when the slot carries no `-` separator
/// ("as soon as possible" orders).
pub const ASAP_FALLBACK_SLOT: &str = "01:00 - 01:30";

/// Half-width of the promotion window, in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 86_400;

/// Date fields extracted from `"<weekday> <day> <month> <year>"`.
///
/// `day` and `year` are kept as raw lenient-parse results. Range checking is
/// left to calendar normalisation in [`crate::delivery_instant`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeliveryDate {
    pub year: i64,
    /// Always 1..=12 (unknown month names resolve to 1).
    pub month: u32,
    pub day: i64,
}

impl DeliveryDate {
    pub fn new(year: i64, month: u32, day: i64) -> Self {
        Self { year, month, day }
    }
}

/// Start of a delivery slot. Not bounds-checked; overflow rolls over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotStart {
    pub hour: i64,
    pub minute: i64,
}

impl SlotStart {
    pub fn new(hour: i64, minute: i64) -> Self {
        Self { hour, minute }
    }
}

/// Tunables for the due decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
    /// An order is due iff `-window_secs < diff <= window_secs`.
    pub window_secs: i64,
    /// Range whose start is used when the slot has no separator.
    pub fallback_slot: String,
}

impl WindowPolicy {
    pub fn new(window_secs: i64, fallback_slot: impl Into<String>) -> Self {
        debug_assert!(window_secs > 0);
        Self {
            window_secs,
            fallback_slot: fallback_slot.into(),
        }
    }

    /// `true` iff a signed `delivery - now` difference falls in the window.
    ///
    /// The lower bound is exclusive and the upper bound inclusive, so a
    /// difference of exactly zero is due.
    pub fn contains(&self, diff_secs: i64) -> bool {
        -self.window_secs < diff_secs && diff_secs <= self.window_secs
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SECS, ASAP_FALLBACK_SLOT)
    }
}

/// Result of evaluating one order's delivery metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDecision {
    pub due: bool,
    pub reason: WindowReason,
    /// Local wall-clock delivery instant, when one could be built.
    pub delivery_at: Option<NaiveDateTime>,
    /// Epoch seconds of the delivery instant, when one could be built.
    pub delivery_ts: Option<i64>,
    /// `delivery_ts - now`, when a delivery instant could be built.
    pub diff_secs: Option<i64>,
}

impl WindowDecision {
    pub(crate) fn skipped(reason: WindowReason) -> Self {
        Self {
            due: false,
            reason,
            delivery_at: None,
            delivery_ts: None,
            diff_secs: None,
        }
    }

    pub fn is_due(&self) -> bool {
        self.due
    }
}

/// Why a decision came out the way it did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowReason {
    WithinWindow,
    OutsideWindow,
    MissingDeliveryDate,
    MissingTimeSlot,
    /// Year (or rolled-over date) falls outside the representable calendar.
    UnrepresentableInstant,
}

impl WindowReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowReason::WithinWindow => "within_window",
            WindowReason::OutsideWindow => "outside_window",
            WindowReason::MissingDeliveryDate => "missing_delivery_date",
            WindowReason::MissingTimeSlot => "missing_time_slot",
            WindowReason::UnrepresentableInstant => "unrepresentable_instant",
        }
    }
}

impl std::fmt::Display for WindowReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
