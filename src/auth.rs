//! Actor identity boundary.
//!
//! Session authentication lives in an upstream service; by the time a
//! request reaches this engine the gateway has resolved the session into
//! `X-Actor-Id` / `X-Actor-Role` headers. This module only parses that
//! contract and enforces role membership per handler.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActorRole {
    Franchise,
    Vendor,
    DeliveryPartner,
    Admin,
}

/// The authenticated caller, as asserted by the upstream session service.
#[derive(Clone, Debug)]
pub struct ActorIdentity {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

impl ActorIdentity {
    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[ActorRole]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "role '{}' may not perform this action",
                self.role
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing X-Actor-Id header".to_string()))?;
        let actor_id = Uuid::parse_str(actor_id)
            .map_err(|_| ApiError::Unauthorized("X-Actor-Id is not a valid UUID".to_string()))?;

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing X-Actor-Role header".to_string()))?;
        let role = role
            .parse::<ActorRole>()
            .map_err(|_| ApiError::Unauthorized(format!("unknown actor role '{}'", role)))?;

        Ok(ActorIdentity { actor_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("vendor".parse::<ActorRole>().unwrap(), ActorRole::Vendor);
        assert_eq!("Admin".parse::<ActorRole>().unwrap(), ActorRole::Admin);
        assert_eq!(
            "delivery_partner".parse::<ActorRole>().unwrap(),
            ActorRole::DeliveryPartner
        );
        assert!("manager".parse::<ActorRole>().is_err());
    }

    #[test]
    fn require_role_enforces_membership() {
        let actor = ActorIdentity {
            actor_id: Uuid::new_v4(),
            role: ActorRole::Vendor,
        };
        assert!(actor.require_role(&[ActorRole::Vendor]).is_ok());
        assert!(actor
            .require_role(&[ActorRole::Franchise, ActorRole::Admin])
            .is_err());
    }
}
