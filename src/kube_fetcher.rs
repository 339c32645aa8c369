use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client};
use tracing::debug;

use crate::namespace::NamespaceFetcher;
use crate::types::{FetchError, Labels};

/// Fetches namespace labels from the cluster API.
#[derive(Clone)]
pub struct KubeNamespaceFetcher {
    api: Api<Namespace>,
}

impl KubeNamespaceFetcher {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl NamespaceFetcher for KubeNamespaceFetcher {
    async fn fetch_namespace(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        let namespace = self
            .api
            .get_opt(name)
            .await
            .map_err(|e| FetchError::Failed {
                namespace: name.to_owned(),
                message: e.to_string(),
            })?;
        debug!(namespace = %name, found = namespace.is_some(), "fetched namespace");
        Ok(namespace.map(|ns| ns.metadata.labels.unwrap_or_default()))
    }
}
