//! Application services layer.
//!
//! This module contains the business logic that sits between the request
//! facade (`api`) and the adapters (`store`, `spotify`, `auth`).

pub mod account_service;
pub mod group_registry;
pub mod playback_sync;
pub mod profile_service;
pub mod repository;

pub use account_service::{AccountService, LoginResponse};
pub use group_registry::{GroupMembers, GroupRegistry, GroupSummary, JoinOutcome, MemberRole};
pub use playback_sync::{MemberSyncResult, MemberTrack, PlaybackSynchronizer};
pub use profile_service::{Attitude, CreatedPlaylist, Personality, Preference, ProfileService};
pub use repository::{DatasetRepository, Mutation};
