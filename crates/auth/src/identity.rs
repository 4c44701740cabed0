//! The authenticated caller.

use crate::{AuthError, Claims};

/// Who is making a request, as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The identity provider's user ID.
    pub external_id: String,
    /// Email address.
    pub email: String,
    /// Display name, if the provider knows one.
    pub name: Option<String>,
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let external_id = claims.subject()?.to_string();
        let email = claims.email.trim().to_string();
        if email.is_empty() {
            return Err(AuthError::InvalidClaims("missing email".to_string()));
        }
        let name = claims
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            external_id,
            email,
            name,
        })
    }
}
