//! Session identity and the session-provider seam.
//!
//! Authentication, token storage and refresh live outside this crate. The workflow only
//! needs to know who is signed in (to pre-fill the signer) and, for transport
//! implementations, the current access token. Both are read-only here.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vetrec_types::NonEmptyText;

/// Role of the signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    /// Pet owner or guardian.
    Owner,
    Veterinarian,
    /// Clinic staff other than veterinarians (nurses, assistants, reception).
    Staff,
}

impl SessionRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Veterinarian => "veterinarian",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "veterinarian" | "vet" => Ok(Self::Veterinarian),
            "staff" => Ok(Self::Staff),
            other => Err(CoreError::InvalidInput(format!(
                "unknown session role: {other:?}"
            ))),
        }
    }
}

/// Who is currently signed in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Display name, used to pre-fill the consent signer.
    pub name: NonEmptyText,
    pub role: SessionRole,
}

impl SessionIdentity {
    pub fn new(name: impl AsRef<str>, role: SessionRole) -> CoreResult<Self> {
        Ok(Self {
            name: NonEmptyText::new(name)?,
            role,
        })
    }
}

/// Read-only access to the current session.
pub trait SessionProvider: Send + Sync {
    fn identity(&self) -> &SessionIdentity;

    /// Bearer token for authenticated requests, if the session has one.
    fn access_token(&self) -> Option<&str>;
}

/// A session fixed at construction time.
///
/// Suitable for command-line use and tests, where identity and token are resolved once at
/// startup.
#[derive(Clone, Debug)]
pub struct StaticSession {
    identity: SessionIdentity,
    access_token: Option<String>,
}

impl StaticSession {
    pub fn new(identity: SessionIdentity, access_token: Option<String>) -> Self {
        let access_token = access_token.filter(|token| !token.trim().is_empty());
        Self {
            identity,
            access_token,
        }
    }
}

impl SessionProvider for StaticSession {
    fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}
