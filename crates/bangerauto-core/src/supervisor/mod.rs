//! Thread lifetimes: cooperative stop signalling and bounded-wait teardown.

mod signal;
mod worker;

pub use signal::StopSignal;
pub use worker::{JoinOutcome, Worker};
