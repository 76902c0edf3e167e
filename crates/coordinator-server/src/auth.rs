//! Identity verification seam.
//!
//! Credential issuance (registration, password hashing, token minting)
//! lives outside this process; the coordinator only consumes the
//! verify step: a connection hands over a token and either receives a
//! stable user id or is refused before any room interaction.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use coordinator_core::UserId;

/// Verification failure. There is deliberately only one externally
/// visible reason: bad, missing, or expired credentials all look the
/// same to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing or invalid credentials")]
    Unauthenticated,
}

/// Turns connection-supplied credentials into a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Pre-shared bearer tokens mapped to user ids.
///
/// Suitable for the standalone binary and tests; a deployment backed
/// by a real token service plugs in its own [`IdentityVerifier`].
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        StaticTokenVerifier::default()
    }

    /// Register one token.
    pub fn insert(&mut self, token: impl Into<String>, user: UserId) {
        self.tokens.insert(token.into(), user);
    }

    /// Parse a `token=userId,token=userId,...` spec (as carried by the
    /// `COORD_AUTH_TOKENS` environment variable).
    pub fn from_spec(spec: &str) -> anyhow::Result<Self> {
        let mut verifier = StaticTokenVerifier::new();
        for pair in spec.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (token, id) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("bad token entry (want token=id): {pair:?}"))?;
            let id: u64 = id.trim().parse()?;
            verifier.insert(token.trim(), UserId(id));
        }
        Ok(verifier)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(token)
            .copied()
            .ok_or(AuthError::Unauthenticated)
    }
}
