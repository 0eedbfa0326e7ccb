//! Ordered validation of a connection attempt.
//!
//! Each rule is a separate step and the pipeline stops at the first failure.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::claim::{Claim, Role};
use crate::store::{IdentityVerifier, UserDirectory};

/// Handshake query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "boatEmblem", default)]
    pub boat_emblem: String,
    #[serde(default)]
    pub token: String,
}

/// Reasons a connection is refused. The text is sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("Boat Emblem Empty")]
    EmptyBoatEmblem,
    #[error("Token Empty")]
    EmptyToken,
    #[error("Token invalid")]
    InvalidToken,
    #[error("Data invalid")]
    IdentityMismatch,
    #[error("user invalid")]
    UnknownUser,
    #[error("boat invalid")]
    UnassociatedBoat,
}

/// An admitted connection: which side of which boat it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub role: Role,
    pub boat_emblem: String,
}

pub fn require_boat_emblem(params: &ConnectParams) -> Result<(), AuthRejection> {
    if params.boat_emblem.is_empty() {
        return Err(AuthRejection::EmptyBoatEmblem);
    }
    Ok(())
}

pub fn require_token(params: &ConnectParams) -> Result<(), AuthRejection> {
    if params.token.is_empty() {
        return Err(AuthRejection::EmptyToken);
    }
    Ok(())
}

/// A boat may only authenticate as itself (exact string match).
pub fn require_matching_boat(claim: &Claim, boat_emblem: &str) -> Result<(), AuthRejection> {
    if claim.role == Role::Boat && claim.identifier != boat_emblem {
        return Err(AuthRejection::IdentityMismatch);
    }
    Ok(())
}

pub struct AdmissionPipeline {
    verifier: Arc<dyn IdentityVerifier>,
    directory: Arc<dyn UserDirectory>,
}

impl AdmissionPipeline {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            verifier,
            directory,
        }
    }

    pub async fn evaluate(&self, params: &ConnectParams) -> Result<Admission, AuthRejection> {
        require_boat_emblem(params)?;
        require_token(params)?;
        let claim = self.verify_token(&params.token).await?;
        require_matching_boat(&claim, &params.boat_emblem)?;
        if claim.role == Role::Observer {
            self.require_observer_access(&claim, &params.boat_emblem).await?;
        }

        Ok(Admission {
            role: claim.role,
            boat_emblem: params.boat_emblem.clone(),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<Claim, AuthRejection> {
        self.verifier.verify(token).await.map_err(|e| {
            debug!("Token verification failed: {}", e);
            AuthRejection::InvalidToken
        })
    }

    /// The observer must be a known user associated with the target boat.
    async fn require_observer_access(
        &self,
        claim: &Claim,
        boat_emblem: &str,
    ) -> Result<(), AuthRejection> {
        let user = match self.directory.find_user(&claim.identifier).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthRejection::UnknownUser),
            Err(e) => {
                warn!("User lookup for '{}' failed: {}", claim.identifier, e);
                return Err(AuthRejection::UnknownUser);
            }
        };

        match self.directory.get_boat_for_user(&user, boat_emblem).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(AuthRejection::UnassociatedBoat),
            Err(e) => {
                warn!(
                    "Boat lookup of '{}' for user '{}' failed: {}",
                    boat_emblem, user.username, e
                );
                Err(AuthRejection::UnassociatedBoat)
            }
        }
    }
}
