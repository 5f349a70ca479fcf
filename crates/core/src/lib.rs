#![forbid(unsafe_code)]

//! Domain model and timing primitives for the learning-session engine:
//! course structure, quizzes, attempts, completion tracking, and the
//! wall-clock countdowns everything above is driven by.

pub mod countdown;
pub mod error;
pub mod model;
pub mod time;

pub use countdown::{Countdown, CountdownScheduler, SUGGESTED_TICK_MILLIS};
pub use error::Error;
pub use time::{Clock, FIXED_TEST_TIMESTAMP, fixed_clock, fixed_now};
