//! Value serializer
//!
//! Two cooperating transforms used at every persistence and network
//! boundary, plus the inverse of the second:
//!
//! - [`sanitize`] strips control characters and angle brackets from string
//!   leaves and drops values that cannot be persisted.
//! - [`to_wire`] turns every point-in-time leaf into canonical timestamp text.
//! - [`rehydrate`] turns canonical text back into points in time for the
//!   fields a consumer names.
//!
//! All three walk the tree with an explicit stack, so nesting depth is
//! bounded by memory rather than by the call stack.

mod sanitize;
mod value;
mod walk;
mod wire;

pub use sanitize::{sanitize, sanitize_str};
pub use value::{Opaque, Value};
pub use wire::{rehydrate, to_wire};
