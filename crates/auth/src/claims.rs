use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use itrax_core::{OrgId, RecordId};

use crate::Role;

/// Which of the two token families a set of claims belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims model.
///
/// Timestamps are seconds since the epoch (`iat`/`exp`) so the standard JWT
/// expiry check applies when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id.
    pub sub: RecordId,

    /// Organization the user belongs to.
    pub org_id: OrgId,

    pub role: Role,

    #[serde(rename = "typ")]
    pub kind: TokenKind,

    pub iat: i64,

    pub exp: i64,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("wrong token type")]
    WrongKind,
}

/// Validate the time window and family of already-decoded claims.
pub fn validate_claims(
    claims: &TokenClaims,
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.kind != expected {
        return Err(TokenValidationError::WrongKind);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: RecordId::new(),
            org_id: OrgId::new(),
            role: Role::Admin,
            kind: TokenKind::Access,
            iat,
            exp,
        }
    }

    #[test]
    fn time_window_is_enforced() {
        let now = Utc::now();
        let t = now.timestamp();

        assert!(validate_claims(&claims(t - 10, t + 60), TokenKind::Access, now).is_ok());
        assert_eq!(
            validate_claims(&claims(t - 120, t - 60), TokenKind::Access, now),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims(t + 60, t + 120), TokenKind::Access, now),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(t, t), TokenKind::Access, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn refresh_claims_are_not_access_claims() {
        let t = Utc::now().timestamp();
        let c = claims(t - 1, t + 60);
        assert_eq!(
            validate_claims(&c, TokenKind::Refresh, Utc::now()),
            Err(TokenValidationError::WrongKind)
        );
    }
}
