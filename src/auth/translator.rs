use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

use crate::auth::basic::{self, Credential};
use crate::config::ProxyConfig;
use crate::utils::{ConfigError, ProxyError, Result};

/// Inbound check and outbound rewrite for one deployment role.
///
/// The outbound header is built once here and cloned onto every forwarded
/// request; it is never recomputed per call.
#[derive(Clone, Debug)]
pub struct CredentialTranslator {
    inbound: Option<Credential>,
    outbound: Option<HeaderValue>,
}

impl CredentialTranslator {
    /// `inbound: None` disables inbound validation; `outbound: None` strips
    /// `Authorization` from forwarded requests.
    pub fn new(inbound: Option<Credential>, outbound: Option<&Credential>) -> Result<Self> {
        let outbound = outbound.map(basic::build).transpose()?;
        Ok(Self { inbound, outbound })
    }

    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        let inbound = if cfg.auth_enabled {
            let cred = cfg
                .inbound_credential
                .clone()
                .ok_or(ConfigError::MissingField("inbound credential"))?;
            Some(cred)
        } else {
            None
        };
        Self::new(inbound, cfg.outbound_credential.as_ref())
    }

    pub fn auth_enabled(&self) -> bool {
        self.inbound.is_some()
    }

    pub fn has_outbound(&self) -> bool {
        self.outbound.is_some()
    }

    /// Validate the caller's `Authorization` header. A no-op when auth is disabled.
    pub fn check_inbound(&self, headers: &HeaderMap) -> Result<()> {
        let Some(expected) = &self.inbound else {
            return Ok(());
        };
        let presented = headers.get(AUTHORIZATION).map(|v| v.as_bytes()).unwrap_or_default();
        if basic::validate(presented, expected) {
            Ok(())
        } else {
            Err(ProxyError::Unauthorized)
        }
    }

    /// Replace every `Authorization` value with the outbound header, or drop it.
    pub fn rewrite_outbound(&self, headers: &mut HeaderMap) {
        match &self.outbound {
            Some(value) => {
                headers.insert(AUTHORIZATION, value.clone());
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
    }
}
