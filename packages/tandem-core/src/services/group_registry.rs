//! Group membership state machine.
//!
//! Responsibilities:
//! - Group creation on first join
//! - Membership transfer (joining a group leaves the previous one)
//! - Leader re-election when the leader departs
//! - Dissolution of groups whose last member left
//!
//! A group moves `nonexistent → active → active (leader reassigned) → dissolved`.
//! There is no explicit leave; leaving is implied by joining another group.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{TandemError, TandemResult};
use crate::events::{EventEmitter, GroupEvent};
use crate::store::{Dataset, Group};
use crate::utils::{now_millis, required_field};

use super::repository::{DatasetRepository, Mutation};

/// Outcome of a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    pub group_name: String,
    /// True if the user was already in this group and nothing changed.
    pub was_already_member: bool,
}

/// One entry of the group listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub member_count: usize,
}

/// A group member and whether they lead the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRole {
    pub user_id: String,
    pub is_leader: bool,
}

/// Members of the caller's group, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembers {
    pub group: String,
    pub members: Vec<MemberRole>,
}

/// Applies a join to `dataset` and returns the events it produced.
///
/// The user is first added to the target group (created if missing), then
/// removed from the group they were in before. If that group is left empty
/// it is deleted; if they led it, a new leader is drawn uniformly at random
/// from the remaining members.
///
/// Joining the group one already belongs to changes nothing and produces no
/// events.
pub fn apply_join<R: Rng + ?Sized>(
    dataset: &mut Dataset,
    user_id: &str,
    group_name: &str,
    rng: &mut R,
) -> (JoinOutcome, Vec<GroupEvent>) {
    let previous = dataset.group_of(user_id).map(|g| g.name.clone());

    if previous.as_deref() == Some(group_name) {
        return (
            JoinOutcome {
                group_name: group_name.to_string(),
                was_already_member: true,
            },
            Vec::new(),
        );
    }

    let timestamp = now_millis();
    let mut events = Vec::new();

    match dataset.group_index(group_name) {
        Some(index) => {
            dataset.groups[index].members.push(user_id.to_string());
            events.push(GroupEvent::MemberJoined {
                group: group_name.to_string(),
                user_id: user_id.to_string(),
                timestamp,
            });
        }
        None => {
            dataset.groups.push(Group::founded_by(group_name, user_id));
            events.push(GroupEvent::Created {
                group: group_name.to_string(),
                leader: user_id.to_string(),
                timestamp,
            });
        }
    }

    if let Some(previous) = previous {
        if let Some(index) = dataset.group_index(&previous) {
            events.extend(leave_group(dataset, index, user_id, timestamp, rng));
        }
    }

    (
        JoinOutcome {
            group_name: group_name.to_string(),
            was_already_member: false,
        },
        events,
    )
}

/// Removes `user_id` from the group at `index`, dissolving or re-electing as needed.
fn leave_group<R: Rng + ?Sized>(
    dataset: &mut Dataset,
    index: usize,
    user_id: &str,
    timestamp: u64,
    rng: &mut R,
) -> Vec<GroupEvent> {
    let group = &mut dataset.groups[index];
    group.members.retain(|m| m != user_id);

    let mut events = vec![GroupEvent::MemberLeft {
        group: group.name.clone(),
        user_id: user_id.to_string(),
        timestamp,
    }];

    if group.members.is_empty() {
        let removed = dataset.groups.remove(index);
        events.push(GroupEvent::Dissolved {
            group: removed.name,
            timestamp,
        });
        return events;
    }

    if group.is_leader(user_id) {
        if let Some(next) = group.members.choose(rng).cloned() {
            group.leader = next.clone();
            events.push(GroupEvent::LeaderElected {
                group: group.name.clone(),
                leader: next,
                previous: user_id.to_string(),
                timestamp,
            });
        }
    }

    events
}

/// Owns every transition of the group state machine.
pub struct GroupRegistry {
    repo: Arc<DatasetRepository>,
    emitter: Arc<dyn EventEmitter>,
}

impl GroupRegistry {
    /// Creates a new GroupRegistry.
    pub fn new(repo: Arc<DatasetRepository>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self { repo, emitter }
    }

    /// Moves `user_id` into `group_name`, creating the group if needed.
    ///
    /// The whole transition is one read-modify-write inside the repository's
    /// critical section. Events are emitted only after the write succeeds.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty group name; `Persistence` if the
    /// dataset cannot be read or written.
    pub async fn join_group(&self, user_id: &str, group_name: &str) -> TandemResult<JoinOutcome> {
        let group_name = required_field(group_name)
            .ok_or_else(|| TandemError::InvalidRequest("group name is required".to_string()))?
            .to_string();
        let user = user_id.to_string();

        let (outcome, events) = self
            .repo
            .mutate(move |dataset| {
                let (outcome, events) =
                    apply_join(dataset, &user, &group_name, &mut rand::thread_rng());
                if outcome.was_already_member {
                    Ok(Mutation::unchanged((outcome, events)))
                } else {
                    Ok(Mutation::changed((outcome, events)))
                }
            })
            .await?;

        if outcome.was_already_member {
            log::debug!(
                "[GroupRegistry] {} is already in {}",
                user_id,
                outcome.group_name
            );
        } else {
            log::info!("[GroupRegistry] {} joined {}", user_id, outcome.group_name);
        }

        for event in events {
            self.emitter.emit_group(event);
        }

        Ok(outcome)
    }

    /// Lists every group with its member count, in dataset order.
    pub async fn group_list(&self) -> TandemResult<Vec<GroupSummary>> {
        let dataset = self.repo.snapshot().await?;
        Ok(dataset
            .groups
            .iter()
            .map(|g| GroupSummary {
                name: g.name.clone(),
                member_count: g.members.len(),
            })
            .collect())
    }

    /// Lists the members of the caller's current group.
    ///
    /// # Errors
    /// `NotAMember` if the caller belongs to no group.
    pub async fn group_members(&self, user_id: &str) -> TandemResult<GroupMembers> {
        let group = self
            .group_of(user_id)
            .await?
            .ok_or_else(|| TandemError::NotAMember(user_id.to_string()))?;

        let members = group
            .members
            .iter()
            .map(|m| MemberRole {
                user_id: m.clone(),
                is_leader: group.is_leader(m),
            })
            .collect();

        Ok(GroupMembers {
            group: group.name,
            members,
        })
    }

    /// Returns the group `user_id` currently belongs to, if any.
    pub async fn group_of(&self, user_id: &str) -> TandemResult<Option<Group>> {
        let dataset = self.repo.snapshot().await?;
        Ok(dataset.group_of(user_id).cloned())
    }
}
