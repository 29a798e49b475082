//! rollcall-attend — attendance flows over the rollcall engine.
//!
//! Drives an [`rollcall_core::EmbeddingExtractor`] on a dedicated service
//! thread for enrollment and recognition, and keeps the in-memory
//! attendance ledger. The surrounding transport (HTTP, image decoding) is
//! a separate layer and hands decoded [`Frame`]s in.

pub mod attendance;
pub mod config;
pub mod frame;
pub mod service;

pub use attendance::{AttendanceError, AttendanceLedger, AttendanceRecord};
pub use config::Config;
pub use frame::Frame;
pub use service::{spawn_service, EnrollOutcome, ServiceError, ServiceHandle};
