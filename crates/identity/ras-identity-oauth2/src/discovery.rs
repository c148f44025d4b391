//! Provider discovery documents, with an optional time-bounded cache.

use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::ProviderMetadata;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Discovery documents keyed by URL, kept for `ttl`.
pub struct DiscoveryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, ProviderMetadata)>>,
}

impl DiscoveryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, url: &str) -> Option<ProviderMetadata> {
        let entries = self.entries.read().await;
        entries
            .get(url)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, metadata)| metadata.clone())
    }

    async fn insert(&self, url: &str, metadata: ProviderMetadata) {
        let mut entries = self.entries.write().await;
        entries.insert(url.to_string(), (Instant::now(), metadata));
    }

    async fn invalidate(&self, url: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(url);
    }
}

pub struct DiscoveryClient {
    http_client: Client,
    cache: Option<DiscoveryCache>,
}

impl DiscoveryClient {
    pub fn new(http_client: Client, cache_ttl: Option<Duration>) -> Self {
        Self {
            http_client,
            cache: cache_ttl.map(DiscoveryCache::new),
        }
    }

    pub async fn fetch(&self, url: &str) -> OAuth2Result<ProviderMetadata> {
        if let Some(cache) = &self.cache {
            if let Some(metadata) = cache.get(url).await {
                debug!("Using cached discovery document for {}", url);
                return Ok(metadata);
            }
        }

        match self.fetch_remote(url).await {
            Ok(metadata) => {
                if let Some(cache) = &self.cache {
                    cache.insert(url, metadata.clone()).await;
                }
                Ok(metadata)
            }
            Err(e) => {
                error!("Discovery document request to {} failed: {}", url, e);
                if let Some(cache) = &self.cache {
                    cache.invalidate(url).await;
                }
                Err(e)
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> OAuth2Result<ProviderMetadata> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(OAuth2Error::DiscoveryFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuth2Error::DiscoveryFailed(e.to_string()))
    }
}
