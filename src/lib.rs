#![deny(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_imports,
    dead_code
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Disallow warnings when running tests.
#![cfg_attr(test, deny(warnings))]
// Disallow warnings in examples.
#![doc(test(attr(deny(warnings))))]

//! Asynchronous TCP connect on io_uring.
//!
//! Submits connects through a completion queue, resolves them whether they
//! finish immediately or have to be awaited through a readiness watch, and
//! checks that a connect linked to a timeout is cancelled when the timeout
//! fires first.
//!
//! # Usage
//!
//! A [`Runner`] drives the three scenarios on a [`Queue`]; in production
//! that queue is a [`Ring`].
//!
//! ```no_run
//! use uring_connect::{Config, Report, Ring, Runner};
//!
//! # fn main() -> uring_connect::Result<()> {
//! let config = Config::default();
//! let ring = Ring::new(config.queue_entries)?;
//! match Runner::new(ring, config).run()? {
//!     Report::Passed => println!("ok"),
//!     Report::Skipped { reason } => println!("skipped: {}", reason),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The lower level pieces are usable on their own: [`connect::connect`]
//! resolves a single connect, [`poll::wait_for`] waits for readiness and
//! [`TimeoutLink`] submits and checks a connect/timeout pair.

#[macro_use]
mod macros;

mod config;
mod error;
mod interest;
mod queue;
mod sys;
mod token;

pub mod connect;
pub mod link;
pub mod op;
pub mod poll;
pub mod scenario;

pub use config::Config;
pub use error::{Error, Result};
pub use interest::{Interest, Readiness};
pub use link::TimeoutLink;
pub use queue::Queue;
pub use scenario::{NoPeer, Report, Runner, Scenario};
pub use sys::{Ring, Socket};
pub use token::Token;
