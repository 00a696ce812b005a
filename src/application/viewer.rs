//! Requester privilege resolution.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const BEARER_PREFIX: &str = "Bearer ";

/// Privilege tier of whoever issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Staff,
}

impl Viewer {
    pub fn is_staff(self) -> bool {
        matches!(self, Viewer::Staff)
    }
}

/// SHA-256 digests of the bearer tokens that grant staff visibility.
#[derive(Debug, Clone, Default)]
pub struct StaffTokens {
    digests: Vec<Vec<u8>>,
}

impl StaffTokens {
    pub fn new(digests: Vec<Vec<u8>>) -> Self {
        Self { digests }
    }

    /// Digest a raw token the way configured digests are expected to be built.
    pub fn digest(token: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hasher.finalize().to_vec()
    }

    /// Resolve the viewer from an `Authorization` header value.
    pub fn resolve(&self, authorization: Option<&str>) -> Viewer {
        let Some(token) = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
        else {
            return Viewer::Anonymous;
        };

        let candidate = Self::digest(token);
        let mut matched = 0u8;
        for digest in &self.digests {
            matched |= digest.ct_eq(&candidate).unwrap_u8();
        }

        if matched == 1 {
            Viewer::Staff
        } else {
            Viewer::Anonymous
        }
    }
}
