//! Process settings, resolved once from the environment at startup.

use std::str::FromStr;
use std::time::Duration;

use vetrec_client::{
    ClientConfig, ClientConfigError, api_base_url_from_env_value, request_timeout_from_env_value,
};
use vetrec_core::{CoreError, SessionIdentity, SessionRole, StaticSession};

pub const API_URL_VAR: &str = "VETREC_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "VETREC_REQUEST_TIMEOUT_SECS";
pub const API_TOKEN_VAR: &str = "VETREC_API_TOKEN";
pub const USER_NAME_VAR: &str = "VETREC_USER_NAME";
pub const USER_ROLE_VAR: &str = "VETREC_USER_ROLE";
pub const LEGAL_TEXT_POLICY_VAR: &str = "VETREC_LEGAL_TEXT_POLICY";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("VETREC_USER_NAME must be set to the signed-in user's name")]
    MissingUserName,
    #[error("{var}: {source}")]
    Session {
        var: &'static str,
        #[source]
        source: CoreError,
    },
    #[error(transparent)]
    Client(#[from] ClientConfigError),
    #[error("VETREC_LEGAL_TEXT_POLICY: expected 'required' or 'optional', got {0:?}")]
    InvalidPolicy(String),
}

/// What `submit` does when the legal texts cannot be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegalTextPolicy {
    /// Abort before the workflow starts.
    #[default]
    Required,
    /// Continue with the version in the request file.
    Optional,
}

impl FromStr for LegalTextPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "optional" => Ok(Self::Optional),
            other => Err(SettingsError::InvalidPolicy(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub client: ClientConfig,
    pub identity: SessionIdentity,
    pub api_token: Option<String>,
    pub legal_text_policy: LegalTextPolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolves settings through `lookup` so parsing can be exercised without touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_base_url = api_base_url_from_env_value(lookup(API_URL_VAR));
        let timeout: Duration = request_timeout_from_env_value(lookup(REQUEST_TIMEOUT_VAR))?;
        let client = ClientConfig::new(&api_base_url, timeout)?;

        let name = present(USER_NAME_VAR).ok_or(SettingsError::MissingUserName)?;
        let role = match present(USER_ROLE_VAR) {
            Some(role) => role.parse::<SessionRole>().map_err(|source| {
                SettingsError::Session {
                    var: USER_ROLE_VAR,
                    source,
                }
            })?,
            None => SessionRole::Owner,
        };
        let identity = SessionIdentity::new(&name, role).map_err(|source| {
            SettingsError::Session {
                var: USER_NAME_VAR,
                source,
            }
        })?;

        let legal_text_policy = match present(LEGAL_TEXT_POLICY_VAR) {
            Some(policy) => policy.parse()?,
            None => LegalTextPolicy::default(),
        };

        Ok(Self {
            client,
            identity,
            api_token: present(API_TOKEN_VAR),
            legal_text_policy,
        })
    }

    pub fn session(&self) -> StaticSession {
        StaticSession::new(self.identity.clone(), self.api_token.clone())
    }
}
