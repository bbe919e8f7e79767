//! Domain types and pure logic shared by every jotpad crate.
//!
//! Nothing in here performs I/O. The [`gateway::Gateway`] trait is the seam
//! between the client store and whichever backend persists rows.

pub mod category;
pub mod change;
pub mod error;
pub mod gateway;
pub mod note;
pub mod session;
pub mod types;
pub mod view;
