//! Commonly used imports
//!
//! Use `use costep::prelude::*;` for quick access to the most common types and functions.

// Core types
pub use crate::{Callback, Coroutine, Error, Request, Resumed, Start, Step};

// The value exchanged with coroutines
pub use serde_json::Value;

// Constructors
pub use crate::build::{done, from_fn, once};

// Execution
pub use crate::driver::{Completion, drive, drive_with};
pub use crate::wrap::{Wrapped, wrap};
