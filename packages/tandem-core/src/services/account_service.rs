//! User accounts: registration, login and external account linking.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::password::{hash_password, verify_decoy, verify_password};
use crate::auth::TokenAuthority;
use crate::error::{TandemError, TandemResult};
use crate::store::User;
use crate::utils::required_field;

use super::repository::{DatasetRepository, Mutation};

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Manages registered users and their credentials.
pub struct AccountService {
    repo: Arc<DatasetRepository>,
    tokens: Arc<TokenAuthority>,
}

impl AccountService {
    /// Creates a new AccountService.
    pub fn new(repo: Arc<DatasetRepository>, tokens: Arc<TokenAuthority>) -> Self {
        Self { repo, tokens }
    }

    /// Registers a new user with a bcrypt password hash.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty username or password; `Conflict` if the
    /// username is taken.
    pub async fn register(&self, username: &str, password: &str) -> TandemResult<()> {
        let username = required_field(username)
            .ok_or_else(|| TandemError::InvalidRequest("username is required".to_string()))?
            .to_string();
        if password.is_empty() {
            return Err(TandemError::InvalidRequest(
                "password is required".to_string(),
            ));
        }

        let password_hash = hash_password(password)
            .map_err(|e| TandemError::InvalidRequest(format!("unusable password: {}", e)))?;
        let name = username.clone();
        self.repo
            .mutate(move |dataset| {
                if dataset.user(&name).is_some() {
                    return Err(TandemError::Conflict(format!(
                        "username {} is already registered",
                        name
                    )));
                }
                dataset.users.push(User {
                    username: name,
                    password_hash,
                    spotify_token: None,
                });
                Ok(Mutation::changed(()))
            })
            .await?;

        log::info!("[AccountService] Registered {}", username);
        Ok(())
    }

    /// Checks credentials and issues a bearer token.
    ///
    /// # Errors
    /// `Unauthenticated` for an unknown user or a wrong password alike.
    pub async fn login(&self, username: &str, password: &str) -> TandemResult<LoginResponse> {
        let username = username.trim();
        let dataset = self.repo.snapshot().await?;

        let verified = match dataset.user(username) {
            Some(user) => verify_password(password, &user.password_hash),
            None => verify_decoy(password),
        };
        if !verified {
            log::debug!("[AccountService] Rejected login for {}", username);
            return Err(TandemError::Unauthenticated(
                "invalid username or password".to_string(),
            ));
        }

        Ok(LoginResponse {
            token: self.tokens.issue(username),
            expires_in: self.tokens.ttl().as_secs(),
        })
    }

    /// Attaches an external music account token to a user.
    ///
    /// Replaces any previously linked token.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty token; `NotFound` for an unknown user.
    pub async fn link_account(&self, user_id: &str, account_token: &str) -> TandemResult<()> {
        let account_token = required_field(account_token)
            .ok_or_else(|| TandemError::InvalidRequest("account token is required".to_string()))?
            .to_string();
        let user = user_id.to_string();

        self.repo
            .mutate(move |dataset| {
                let record = dataset
                    .user_mut(&user)
                    .ok_or_else(|| TandemError::NotFound(format!("user {}", user)))?;
                if record.spotify_token.as_deref() == Some(account_token.as_str()) {
                    return Ok(Mutation::unchanged(()));
                }
                record.spotify_token = Some(account_token);
                Ok(Mutation::changed(()))
            })
            .await?;

        log::info!("[AccountService] Linked external account for {}", user_id);
        Ok(())
    }
}
