//! dwp-runtime
//!
//! One promotion pass over the pending orders, plus the pieces that make it
//! safe to call from a timer: an injectable clock and a non-blocking
//! re-entrancy guard.
//!
//! The pass itself is synchronous and sequential. Callers on an async runtime
//! move [`PromotionRunner::run_once`] onto a blocking thread.

mod clock;
mod guard;
mod pass;
mod report;
mod runner;

pub use clock::{Clock, FixedClock, SystemClock};
pub use guard::{PassGuard, PassPermit};
pub use pass::{run_pass, PassError, PassSettings};
pub use report::{OrderAction, OrderOutcome, PassReport};
pub use runner::{PassOutcome, PromotionRunner};

pub use dwp_config::FailurePolicy;
