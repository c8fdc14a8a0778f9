//! Tandem Core - listening groups with synchronized Spotify playback.
//!
//! Users join named groups; each group has exactly one leader, and any member
//! can push what they are playing to everyone else in the group.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`store`]: Dataset model and whole-document persistence (memory, JSON file)
//! - [`auth`]: Bearer token issuing/verification and password hashing
//! - [`spotify`]: Spotify Web API client (playback and library)
//! - [`services`]: Group state machine, playback fan-out, accounts, profiles
//! - [`api`]: Authenticated request facade over the services
//! - [`events`]: Group lifecycle events
//! - [`bootstrap`]: Composition root
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from concrete
//! adapters:
//!
//! - [`Store`](store::Store): Loading and saving the dataset
//! - [`AuthProvider`](auth::AuthProvider): Verifying bearer credentials
//! - [`PlaybackProvider`](spotify::PlaybackProvider): Reading and starting playback
//! - [`MusicLibrary`](spotify::MusicLibrary): Top tracks, audio features, playlists
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events

#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod protocol_constants;
pub mod services;
pub mod spotify;
pub mod store;
pub mod utils;

// Re-export commonly used types at the crate root
pub use config::{AuthConfig, Config, MissingAccountPolicy, SpotifyConfig, SyncConfig};
pub use error::{ErrorCode, PlaybackResult, StoreResult, TandemError, TandemResult};
pub use events::{EventEmitter, GroupEvent, LoggingEventEmitter, NoopEventEmitter};
pub use utils::now_millis;

// Re-export adapter types
pub use auth::{AuthProvider, TokenAuthority};
pub use spotify::{MusicLibrary, PlaybackProvider, SpotifyApi, SpotifyClient};
pub use store::{Dataset, Group, JsonFileStore, MemoryStore, Store, User};

// Re-export service types
pub use services::{
    GroupMembers, GroupSummary, JoinOutcome, MemberRole, MemberSyncResult, MemberTrack,
    Personality,
};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, bootstrap_with_spotify, BootstrappedServices};

// Re-export API types
pub use api::{GroupView, MemberView, TandemApi};
