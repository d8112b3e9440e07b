//! # Axiom Focus
//!
//! Focus and input-grab arbitration core for the Axiom window manager.
//!
//! ## Architecture
//!
//! The crate is built from a few small modules:
//! - `focus`: Focus controller, per-screen focus ring and click-to-focus grab table
//! - `client`: The focus core's mirror of managed clients and their hints
//! - `timestamp`: Wraparound-aware protocol event timestamps
//! - `backend`: Display-server primitives the core drives (input focus, grabs)
//! - `events`: Window manager notifications and their dispatch
//! - `config`: Focus policy configuration
//!
//! ## Usage
//!
//! ```rust
//! use axiom_focus::{AxiomFocusConfig, ClientHints, ClientId, FocusManager, ScreenId, Timestamp};
//! use axiom_focus::backend::RecordingBackend;
//!
//! let mut focus = FocusManager::new(RecordingBackend::new(), AxiomFocusConfig::default());
//! focus.add_screen(ScreenId(0), 0);
//! focus.client_created(ClientId(1), ScreenId(0), ClientHints::default(), Timestamp(100));
//!
//! assert_eq!(focus.get_focus(), Some(ClientId(1)));
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod events;
pub mod focus;
pub mod timestamp;

// Re-export main types for easy access
pub use backend::{BackendError, FocusBackend, InputTarget, LoggingBackend};
pub use client::{Client, ClientHints, ClientId, FocusHint, GroupId, ScreenId, WindowType};
pub use config::AxiomFocusConfig;
pub use events::{CycleDirection, WmEvent};
pub use focus::{FocusFlags, FocusManager, FocusSnapshot, SearchMask, SharedFocus};
pub use timestamp::Timestamp;

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Axiom Focus
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
