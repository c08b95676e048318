//! `mobility` - preference and saved-route core for an indoor navigation
//! assistant aimed at visually impaired users.
//!
//! Two write-through stores sit on top of an injected [`KeyValueStore`]:
//! [`PreferencesStore`] for accessibility and navigation options, and
//! [`RouteStore`] for the user's saved origin/destination pairs. Both publish
//! change events that views subscribe to.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod guidance;
pub mod logging;
pub mod preferences;
pub mod routes;
pub mod storage;

pub use backup::BackupFile;
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventBus, PreferenceChange, RoutesChanged};
pub use guidance::{begin_navigation, NavigationOutcome, NavigationRequest};
pub use logging::init_logging;
pub use preferences::{PreferenceKey, Preferences, PreferencesStore, RouteType, Snapshot, TextSize};
pub use routes::{Route, RouteStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, Value};
