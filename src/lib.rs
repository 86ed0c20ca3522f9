//! Client for preparing marketing/newsletter audience segments.
//!
//! A campaign category, a target response rate, optional newsletter
//! content, and an uploaded identifiers file go in; the segmentation
//! backend partitions the identifiers into contact-channel groups and the
//! resulting statistics plus a downloadable archive come back. This crate
//! owns the client half of that exchange: the form model, the explicit
//! session state machine gating each step, the typed HTTP contract, and
//! the terminal surfaces built on top.

pub mod backend;
pub mod commands;
pub mod config;
pub mod form;
pub mod notify;
pub mod services;
pub mod session;

pub use backend::{BackendClient, BackendError, SelectionOutcome, SelectionStats, UploadContract};
pub use config::Settings;
pub use form::{Category, FormState};
pub use notify::{ConsoleNotifier, MemoryNotifier, Notifier};
pub use services::{SegmentError, SegmentService};
pub use session::{Phase, Session, SessionEvent};
