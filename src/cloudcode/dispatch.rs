//! Endpoint dispatcher: send a built request across the backend hosts.
//!
//! Hosts are tried in priority order. Any non-auth failure advances to the
//! next host. An authentication failure on a host's first attempt triggers
//! a refresh cycle (drop the project, refresh the credential, re-resolve the
//! project, patch the payload) and retries that *same* host once; if the
//! retry fails too, the loop moves on with the refreshed token.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::auth::{CredentialSource, mask_token};
use crate::cloudcode::constants::API_PATH_GENERATE_CONTENT;
use crate::cloudcode::discovery::ProjectResolver;
use crate::cloudcode::error::{GatewayError, Result};
use crate::cloudcode::models::google::{CloudCodeRequest, GoogleResponse};
use crate::cloudcode::transport::Transport;

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
    resolver: Arc<ProjectResolver>,
    hosts: Vec<String>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialSource>,
        resolver: Arc<ProjectResolver>,
        hosts: Vec<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            resolver,
            hosts,
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Send `payload`, returning the first successful response.
    ///
    /// `payload.project` is rewritten if a credential refresh happens.
    #[instrument(skip(self, payload, token), fields(model = %payload.model))]
    pub async fn send(&self, payload: &mut CloudCodeRequest, token: String) -> Result<GoogleResponse> {
        if self.hosts.is_empty() {
            return Err(GatewayError::config("no backend endpoints configured"));
        }

        let mut token = token;
        let mut last: Option<GatewayError> = None;

        for host in &self.hosts {
            let mut retrying = false;
            loop {
                debug!(host = %host, retry = retrying, "Trying endpoint");
                let err = match self.attempt(host, &token, payload).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                };

                if err.is_auth_error() && !retrying {
                    warn!(host = %host, error = %err, "Authentication rejected, refreshing credential");
                    token = self.refresh(payload).await?;
                    last = Some(err);
                    retrying = true;
                    continue;
                }

                warn!(host = %host, error = %err, "Endpoint failed");
                last = Some(err);
                break;
            }
        }

        let last = last.unwrap_or_else(|| GatewayError::config("no endpoint attempted"));
        Err(GatewayError::Exhausted {
            last: Box::new(last),
        })
    }

    async fn attempt(&self, host: &str, token: &str, payload: &CloudCodeRequest) -> Result<GoogleResponse> {
        let body = serde_json::to_value(&*payload)?;
        let value = self
            .transport
            .post(host, API_PATH_GENERATE_CONTENT, token, &body)
            .await?
            .into_json()?;
        Ok(GoogleResponse::from_body(value)?)
    }

    async fn refresh(&self, payload: &mut CloudCodeRequest) -> Result<String> {
        self.resolver.invalidate().await;
        let token = self.credentials.force_refresh().await?;
        let project = self.resolver.resolve(&token).await;
        info!(token = %mask_token(&token), project = %project, "Credential refreshed");
        payload.project = project;
        Ok(token)
    }
}
