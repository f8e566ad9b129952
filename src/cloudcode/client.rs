//! Cloud Code client: the request pipeline behind `/v1/messages`.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ccgate::auth::StaticCredentials;
//! use ccgate::cloudcode::{CloudCodeClient, MessagesRequest};
//!
//! let client = CloudCodeClient::builder()
//!     .credentials(Arc::new(StaticCredentials::new("ya29...")))
//!     .build()?;
//! let response = client
//!     .complete(&MessagesRequest::simple("claude-sonnet-4-5", 1024, "Hello"))
//!     .await?;
//! println!("{}", response.text());
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::auth::{CredentialSource, mask_token};
use crate::cloudcode::constants::{CLOUDCODE_ENDPOINTS, DEFAULT_PROJECT_ID, DEFAULT_STREAM_CHUNK_SIZE};
use crate::cloudcode::convert::{ModelMap, build_request, convert_response};
use crate::cloudcode::discovery::{ProjectCache, ProjectResolver};
use crate::cloudcode::dispatch::Dispatcher;
use crate::cloudcode::error::{GatewayError, Result};
use crate::cloudcode::models::{MessagesRequest, MessagesResponse};
use crate::cloudcode::synth::{EventStream, synthesize};
use crate::cloudcode::transport::{HttpTransport, Transport};
use crate::net::HttpClient;

pub struct CloudCodeClient {
    credentials: Arc<dyn CredentialSource>,
    resolver: Arc<ProjectResolver>,
    dispatcher: Dispatcher,
    models: ModelMap,
    chunk_size: usize,
}

impl CloudCodeClient {
    pub fn builder() -> CloudCodeClientBuilder {
        CloudCodeClientBuilder::default()
    }

    /// Run one Messages request end to end: token, project, envelope,
    /// dispatch, conversion.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn complete(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let token = self.credentials.get_token().await?;
        let project = self.resolver.resolve(&token).await;

        let mut payload = build_request(request, &project, &self.models);
        debug!(
            backend_model = %payload.model,
            project = %payload.project,
            messages = request.messages.len(),
            has_tools = payload.request.tools.is_some(),
            "Dispatching request"
        );

        let response = self.dispatcher.send(&mut payload, token).await?;
        let converted = convert_response(&response, &request.model);

        debug!(
            stop_reason = ?converted.stop_reason,
            input_tokens = converted.usage.input_tokens,
            output_tokens = converted.usage.output_tokens,
            "Request completed"
        );
        Ok(converted)
    }

    /// Replay a finished response as a Messages event stream.
    pub fn stream(&self, response: MessagesResponse) -> EventStream {
        synthesize(response, self.chunk_size)
    }

    /// Drop the cached project and force a new credential.
    pub async fn refresh(&self) -> Result<String> {
        self.resolver.invalidate().await;
        let token = self.credentials.force_refresh().await?;
        debug!(token = %mask_token(&token), "Credential refreshed on demand");
        Ok(token)
    }

    pub async fn token(&self) -> Result<String> {
        Ok(self.credentials.get_token().await?)
    }

    pub async fn cached_project(&self) -> Option<String> {
        self.resolver.cached().await
    }

    pub fn credential_source(&self) -> &str {
        self.credentials.name()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Builder for [`CloudCodeClient`].
pub struct CloudCodeClientBuilder {
    credentials: Option<Arc<dyn CredentialSource>>,
    transport: Option<Arc<dyn Transport>>,
    hosts: Vec<String>,
    default_project: String,
    models: ModelMap,
    chunk_size: usize,
    cache: ProjectCache,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl Default for CloudCodeClientBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            transport: None,
            hosts: CLOUDCODE_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            default_project: DEFAULT_PROJECT_ID.to_string(),
            models: ModelMap::new(),
            chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            cache: ProjectCache::new(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

impl CloudCodeClientBuilder {
    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the HTTP transport (tests use an in-memory one).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Backend hosts in priority order.
    pub fn hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = project.into();
        self
    }

    pub fn models(mut self, models: ModelMap) -> Self {
        self.models = models;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Share a project cache with other components.
    pub fn project_cache(mut self, cache: ProjectCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CloudCodeClient> {
        let credentials = self
            .credentials
            .ok_or_else(|| GatewayError::config("no credential source configured"))?;
        if self.hosts.is_empty() {
            return Err(GatewayError::config("no backend endpoints configured"));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut http = HttpClient::builder();
                if let Some(timeout) = self.connect_timeout {
                    http = http.connect_timeout(timeout);
                }
                if let Some(timeout) = self.request_timeout {
                    http = http.request_timeout(timeout);
                }
                Arc::new(HttpTransport::new(http.build()))
            }
        };

        let resolver = Arc::new(
            ProjectResolver::new(transport.clone(), self.cache, self.hosts.clone())
                .with_default_project(self.default_project),
        );
        let dispatcher = Dispatcher::new(transport, credentials.clone(), resolver.clone(), self.hosts);

        Ok(CloudCodeClient {
            credentials,
            resolver,
            dispatcher,
            models: self.models,
            chunk_size: self.chunk_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;

    #[test]
    fn test_builder_requires_credentials() {
        assert!(matches!(
            CloudCodeClient::builder().build(),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_builder_rejects_empty_hosts() {
        let result = CloudCodeClient::builder()
            .credentials(Arc::new(StaticCredentials::new("tok")))
            .hosts(vec![])
            .build();
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let client = CloudCodeClient::builder()
            .credentials(Arc::new(StaticCredentials::new("tok")))
            .chunk_size(0)
            .build()
            .unwrap();
        assert_eq!(client.chunk_size(), 1);
        assert_eq!(client.credential_source(), "static");
    }
}
