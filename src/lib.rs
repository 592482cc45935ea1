//! # Costep: drive step-wise computations to one async completion
//!
//! A [`Coroutine`] pauses by yielding a [`Request`] ("I need the result of X
//! before continuing"). [`drive`] resolves each request, resumes the
//! coroutine with the result (or raises the failure into it) and settles a
//! single [`Completion`] once the coroutine finishes.
//!
//! ## Request shapes
//!
//! - [`Request::Future`] - awaited as-is
//! - [`Request::Coroutine`] / [`Request::Factory`] - driven recursively
//! - [`Request::Thunk`] - a function settled through a trailing [`Callback`]
//! - [`Request::All`] / [`Request::Map`] - every member resolved concurrently
//! - [`Request::Value`] - arrays and objects resolve to themselves, scalars
//!   are rejected
//!
//! ## Example
//!
//! ```
//! use costep::prelude::*;
//! use serde_json::json;
//!
//! let greet = once(
//!     Request::map([
//!         ("name", Request::thunk(|cb| cb.ok(json!("ada")))),
//!         ("greeting", Request::value(json!("hello"))),
//!     ]),
//!     |res| {
//!         let parts = res?;
//!         Ok(json!(format!("{} {}", parts["greeting"].as_str().unwrap_or(""), parts["name"].as_str().unwrap_or(""))))
//!     },
//! );
//!
//! let out = futures::executor::block_on(drive(greet.boxed())).unwrap();
//! assert_eq!(out, json!("hello ada"));
//! ```
//!
//! ## Common functions
//!
//! **Building coroutines:**
//! - [`from_fn(f)`](from_fn) - one closure sees every resume and raise
//! - [`once(request, f)`](once) - yield one request, finish with `f`
//! - [`done(value)`](done) - finish immediately
//!
//! **Execution:**
//! - [`drive(start)`](drive) - drive a coroutine or pass a value through
//! - [`drive_with(factory, args)`](drive_with) - build, then drive
//! - [`wrap(factory)`](wrap) - reusable async operation over a factory

mod build;
mod coroutine;
mod driver;
mod error;
mod join;
mod normalize;
pub mod prelude;
mod request;
mod step;
mod wrap;

pub use build::*;
pub use coroutine::*;
pub use driver::*;
pub use error::*;
pub use normalize::*;
pub use request::*;
pub use step::*;
pub use wrap::*;
