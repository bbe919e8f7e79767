//! Client-side note/category store for jotpad.
//!
//! - [`NoteStore`] - the in-memory cache of the signed-in user's notes and
//!   categories; every mutation goes through it, and realtime change events
//!   are reconciled into it by `updated_at` comparison.
//! - [`AutosaveCoordinator`] - debounces editor changes into single writes.
//! - [`Workspace`] - the single-owner event loop tying the store, autosave
//!   and change feed together.
//! - Persistence strategies: [`LocalFileGateway`] (local-only, two storage
//!   keys) and [`MemoryGateway`] (in-process, feeds a
//!   [`ChangeFeed`](jotpad_events::ChangeFeed)); `jotpad-db` provides the
//!   PostgreSQL one.

pub mod auth;
pub mod autosave;
pub mod config;
pub mod error;
pub mod local;
pub mod memory;
pub mod notify;
pub mod store;
mod tables;
pub mod workspace;

pub use autosave::{AutosaveCoordinator, AutosaveState, FieldEdit, PendingWrite};
pub use config::{StoreConfig, WriteMode};
pub use error::{ErrorKind, StoreError};
pub use local::LocalFileGateway;
pub use memory::{GatewayOp, MemoryGateway};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use store::NoteStore;
pub use workspace::{Wake, Workspace};
