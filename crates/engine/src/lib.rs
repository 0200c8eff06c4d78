//! Backfill engine for tickvault
//!
//! The engine walks the upstream backwards in time. The upstream returns the
//! newest records of any requested window, so walking forward would require
//! guessing a window small enough that its newest records are also the
//! oldest-not-yet-fetched, which is impossible without knowing trade density in
//! advance. Walking backwards, each chunk's newest records are bounded by
//! the previous chunk's oldest id, and requiring that overlap (the "anchor")
//! guarantees contiguity.
//!
//! Layers, outermost first:
//! - [`Grabber::extend_row`] / [`Grabber::extend_ring`]: sequential batch
//!   driver over a [`SymbolSelector`], once or periodically
//! - [`Grabber::extend`]: range planner reconciling a requested interval
//!   against the stored bounds of one symbol (tail/head/full)
//! - [`Grabber::grab`]: the chunked backwards walk over one target interval

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cancel;
mod driver;
mod grabber;
mod planner;
mod window;

pub use cancel::CancelFlag;
pub use driver::{RingConfig, RowReport, SymbolSelector};
pub use grabber::{GrabOutcome, GrabReport, Grabber, GrabberConfig, TargetRange};
pub use planner::{ExtendReport, TimeBound};
