//! Routing project discovery.
//!
//! The backend routes every generation call through a project id obtained
//! from `loadCodeAssist`. The id is resolved once, cached in a shared
//! [`ProjectCache`], and dropped again whenever the credential changes.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::cloudcode::constants::{API_PATH_LOAD_CODE_ASSIST, DEFAULT_PROJECT_ID};
use crate::cloudcode::error::Result;
use crate::cloudcode::models::google::LoadCodeAssistResponse;
use crate::cloudcode::transport::Transport;

/// Shared, process-wide routing project slot. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct ProjectCache(Arc<RwLock<Option<String>>>);

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<String> {
        self.0.read().await.clone()
    }

    pub async fn set(&self, project: impl Into<String>) {
        *self.0.write().await = Some(project.into());
    }

    pub async fn clear(&self) {
        self.0.write().await.take();
    }
}

/// Resolves the routing project, consulting the cache first.
pub struct ProjectResolver {
    transport: Arc<dyn Transport>,
    cache: ProjectCache,
    hosts: Vec<String>,
    default_project: String,
}

impl ProjectResolver {
    pub fn new(transport: Arc<dyn Transport>, cache: ProjectCache, hosts: Vec<String>) -> Self {
        Self {
            transport,
            cache,
            hosts,
            default_project: DEFAULT_PROJECT_ID.to_string(),
        }
    }

    /// Project used when no host reports one.
    pub fn with_default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = project.into();
        self
    }

    /// Cached project, then `loadCodeAssist` on each host in order, then the
    /// default. Whatever is returned is cached. Never fails.
    #[instrument(skip(self, token))]
    pub async fn resolve(&self, token: &str) -> String {
        if let Some(project) = self.cache.get().await {
            return project;
        }

        for host in &self.hosts {
            match self.load_code_assist(host, token).await {
                Ok(Some(project)) => {
                    info!(project = %project, host = %host, "Discovered project");
                    self.cache.set(project.clone()).await;
                    return project;
                }
                Ok(None) => debug!(host = %host, "loadCodeAssist returned no project"),
                Err(e) => warn!(host = %host, error = %e, "loadCodeAssist failed"),
            }
        }

        warn!(project = %self.default_project, "No project discovered, using default");
        self.cache.set(self.default_project.clone()).await;
        self.default_project.clone()
    }

    /// Drop the cached project unconditionally.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }

    /// Peek at the cached project without resolving.
    pub async fn cached(&self) -> Option<String> {
        self.cache.get().await
    }

    async fn load_code_assist(&self, host: &str, token: &str) -> Result<Option<String>> {
        let body = json!({
            "metadata": {
                "ideType": "IDE_UNSPECIFIED",
                "platform": "PLATFORM_UNSPECIFIED",
                "pluginType": "GEMINI",
            }
        });
        let value = self
            .transport
            .post(host, API_PATH_LOAD_CODE_ASSIST, token, &body)
            .await?
            .into_json()?;
        let response: LoadCodeAssistResponse = serde_json::from_value(value)?;
        Ok(response.project_id())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::cloudcode::error::GatewayError;
    use crate::cloudcode::transport::RawResponse;

    /// Replies per host from a fixed table and records every call.
    struct TableTransport {
        replies: Vec<(&'static str, Option<RawResponse>)>,
        calls: Mutex<Vec<String>>,
    }

    impl TableTransport {
        fn new(replies: Vec<(&'static str, Option<RawResponse>)>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for TableTransport {
        async fn post(&self, host: &str, path: &str, _token: &str, _body: &Value) -> Result<RawResponse> {
            assert_eq!(path, API_PATH_LOAD_CODE_ASSIST);
            self.calls.lock().unwrap().push(host.to_string());
            match self.replies.iter().find(|(h, _)| *h == host) {
                Some((_, Some(reply))) => Ok(reply.clone()),
                _ => Err(GatewayError::Network("connection refused".into())),
            }
        }
    }

    fn hosts() -> Vec<String> {
        vec!["https://a".into(), "https://b".into(), "https://c".into()]
    }

    #[tokio::test]
    async fn test_cached_value_wins() {
        let transport = TableTransport::new(vec![]);
        let cache = ProjectCache::new();
        cache.set("cached-project").await;
        let resolver = ProjectResolver::new(transport.clone(), cache, hosts());

        assert_eq!(resolver.resolve("tok").await, "cached-project");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_successful_host_is_cached() {
        let transport = TableTransport::new(vec![
            ("https://a", Some(RawResponse::new(500, "boom"))),
            (
                "https://b",
                Some(RawResponse::new(200, r#"{"cloudaicompanionProject":"proj-b"}"#)),
            ),
        ]);
        let resolver = ProjectResolver::new(transport.clone(), ProjectCache::new(), hosts());

        assert_eq!(resolver.resolve("tok").await, "proj-b");
        assert_eq!(resolver.cached().await.as_deref(), Some("proj-b"));
        assert_eq!(transport.calls(), vec!["https://a", "https://b"]);

        resolver.resolve("tok").await;
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_object_form_project() {
        let transport = TableTransport::new(vec![(
            "https://a",
            Some(RawResponse::new(200, r#"{"cloudaicompanionProject":{"id":"proj-obj"}}"#)),
        )]);
        let resolver = ProjectResolver::new(transport, ProjectCache::new(), hosts());
        assert_eq!(resolver.resolve("tok").await, "proj-obj");
    }

    #[tokio::test]
    async fn test_falls_back_to_default() {
        let transport = TableTransport::new(vec![
            ("https://a", Some(RawResponse::new(200, "{}"))),
            ("https://b", Some(RawResponse::new(403, "denied"))),
        ]);
        let resolver = ProjectResolver::new(transport.clone(), ProjectCache::new(), hosts());

        assert_eq!(resolver.resolve("tok").await, DEFAULT_PROJECT_ID);
        assert_eq!(resolver.cached().await.as_deref(), Some(DEFAULT_PROJECT_ID));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_configured_default() {
        let transport = TableTransport::new(vec![]);
        let resolver = ProjectResolver::new(transport, ProjectCache::new(), hosts())
            .with_default_project("my-default");
        assert_eq!(resolver.resolve("tok").await, "my-default");
    }

    #[tokio::test]
    async fn test_invalidate_clears() {
        let cache = ProjectCache::new();
        cache.set("stale").await;
        let resolver = ProjectResolver::new(TableTransport::new(vec![]), cache.clone(), hosts());

        resolver.invalidate().await;
        assert_eq!(resolver.cached().await, None);
        assert_eq!(cache.get().await, None);
    }
}
