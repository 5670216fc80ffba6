//! dwp-window
//!
//! Delivery-window evaluation: turns the raw delivery-date and time-slot
//! metadata of an order into a delivery instant and decides whether the order
//! is due for promotion relative to `now`.
//!
//! Pure deterministic logic. No IO, no wall-clock. Callers supply `now` and the
//! timezone the host platform stores its metadata in.
//!
//! Parsing is lenient on purpose: malformed numbers decay to 0 and unknown
//! month names resolve to January, so bad metadata yields a deterministic
//! decision instead of an error that would stop a batch.

mod evaluator;
mod instant;
mod month;
mod parse;
mod types;

pub use evaluator::evaluate;
pub use instant::{delivery_instant, DeliveryZone, ZoneParseError};
pub use month::{resolve_french_month, FRENCH_MONTHS};
pub use parse::{lenient_int, parse_delivery_date, parse_slot_start};
pub use types::*;
