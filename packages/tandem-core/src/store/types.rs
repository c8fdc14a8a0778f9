//! Dataset records.
//!
//! The serialized field names (`username`, `password`, `spotifyToken`,
//! `name`, `leader`, `members`) are the on-disk JSON layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique, stable identifier.
    pub username: String,
    /// Salted credential hash (see [`crate::auth::password`]).
    #[serde(rename = "password")]
    pub password_hash: String,
    /// Linked external music account token, once attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_token: Option<String>,
}

/// A listening group.
///
/// `members` is kept in insertion order and is never empty while the group
/// is stored; `leader` is always one of `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique, human-chosen group name.
    pub name: String,
    /// Member currently acting as leader.
    pub leader: String,
    /// Member identifiers in join order.
    pub members: Vec<String>,
}

impl Group {
    /// Creates a group whose sole member is also its leader.
    pub fn founded_by(name: &str, user_id: &str) -> Self {
        Self {
            name: name.to_string(),
            leader: user_id.to_string(),
            members: vec![user_id.to_string()],
        }
    }

    /// Checks whether `user_id` is a member.
    pub fn contains(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    /// Checks whether `user_id` is the leader.
    pub fn is_leader(&self, user_id: &str) -> bool {
        self.leader == user_id
    }
}

/// The full persisted document: every user and every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Dataset {
    /// Finds a user by identifier.
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == user_id)
    }

    /// Finds a user by identifier for mutation.
    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.username == user_id)
    }

    /// Returns the linked account token for a user, if any.
    pub fn account_token(&self, user_id: &str) -> Option<&str> {
        self.user(user_id)?.spotify_token.as_deref()
    }

    /// Finds a group by name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Returns the position of a group by name.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Finds the group `user_id` currently belongs to.
    pub fn group_of(&self, user_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains(user_id))
    }

    /// Validates every dataset invariant.
    ///
    /// - usernames and group names are unique
    /// - every group is non-empty and its leader is a member
    /// - no member is listed twice in a group
    /// - every user belongs to at most one group
    pub fn validate(&self) -> Result<(), String> {
        let mut usernames = HashSet::new();
        for user in &self.users {
            if !usernames.insert(user.username.as_str()) {
                return Err(format!("duplicate user '{}'", user.username));
            }
        }

        let mut group_names = HashSet::new();
        let mut seen_members: HashSet<&str> = HashSet::new();
        for group in &self.groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(format!("duplicate group '{}'", group.name));
            }
            if group.members.is_empty() {
                return Err(format!("group '{}' has no members", group.name));
            }
            if !group.contains(&group.leader) {
                return Err(format!(
                    "leader '{}' of group '{}' is not a member",
                    group.leader, group.name
                ));
            }
            for member in &group.members {
                if !seen_members.insert(member.as_str()) {
                    return Err(format!(
                        "user '{}' appears more than once across groups",
                        member
                    ));
                }
            }
        }

        Ok(())
    }
}
