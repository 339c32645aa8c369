use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, trace, warn};

use crate::types::{CandidateObject, EvalError, FetchError, Labels};

/// Fetch timeout used by [`NamespaceCache::with_default_timeout`].
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of truth for namespace labels, typically the cluster API.
///
/// `Ok(None)` means the namespace does not exist.
#[async_trait]
pub trait NamespaceFetcher: Send + Sync {
    async fn fetch_namespace(&self, name: &str) -> Result<Option<Labels>, FetchError>;
}

/// Read access to namespace labels, as needed by the selector matcher.
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    async fn namespace_labels(&self, name: &str) -> Result<Option<Labels>, FetchError>;
}

/// A fixed namespace table. Handy for tests and offline evaluation.
#[async_trait]
impl NamespaceLookup for BTreeMap<String, Labels> {
    async fn namespace_labels(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        Ok(self.get(name).cloned())
    }
}

/// Memoizing namespace label cache shared by concurrent evaluations.
///
/// Population on miss goes through the injected [`NamespaceFetcher`] and is
/// bounded by the configured timeout. Concurrent misses for the same name
/// share one in-flight fetch. Failed and not-found lookups are not cached.
pub struct NamespaceCache {
    entries: DashMap<String, Arc<OnceCell<Labels>>>,
    fetcher: Arc<dyn NamespaceFetcher>,
    timeout: Duration,
}

enum Miss {
    NotFound,
    Failed(FetchError),
}

impl NamespaceCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn NamespaceFetcher>, timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            fetcher,
            timeout,
        }
    }

    #[must_use]
    pub fn with_default_timeout(fetcher: Arc<dyn NamespaceFetcher>) -> Self {
        Self::new(fetcher, DEFAULT_FETCH_TIMEOUT)
    }

    /// Labels of namespace `name`, fetching them on first use.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fetcher fails or does not answer within
    /// the timeout.
    #[instrument(skip(self), fields(timeout = ?self.timeout))]
    pub async fn labels(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        let cell = match self.entries.get(name) {
            Some(entry) => Arc::clone(entry.value()),
            None => Arc::clone(self.entries.entry(name.to_owned()).or_default().value()),
        };
        if let Some(labels) = cell.get() {
            trace!("namespace cache hit");
            return Ok(Some(labels.clone()));
        }

        let result = cell
            .get_or_try_init(|| async {
                debug!("namespace cache miss, fetching");
                match tokio::time::timeout(self.timeout, self.fetcher.fetch_namespace(name)).await
                {
                    Ok(Ok(Some(labels))) => Ok(labels),
                    Ok(Ok(None)) => Err(Miss::NotFound),
                    Ok(Err(err)) => Err(Miss::Failed(err)),
                    Err(_) => Err(Miss::Failed(FetchError::Timeout {
                        namespace: name.to_owned(),
                        timeout: self.timeout,
                    })),
                }
            })
            .await;

        match result {
            Ok(labels) => Ok(Some(labels.clone())),
            Err(miss) => {
                self.entries.remove_if(name, |_, c| c.get().is_none());
                match miss {
                    Miss::NotFound => {
                        debug!("namespace not found");
                        Ok(None)
                    }
                    Miss::Failed(err) => {
                        warn!(error = %err, "namespace fetch failed");
                        Err(err)
                    }
                }
            }
        }
    }

    /// Store labels observed elsewhere, e.g. from a namespace watch,
    /// replacing any cached value.
    pub fn insert(&self, name: &str, labels: Labels) {
        self.entries
            .insert(name.to_owned(), Arc::new(OnceCell::new_with(Some(labels))));
    }

    /// Drop the cached labels of `name`; the next lookup fetches again.
    pub fn invalidate(&self, name: &str) {
        self.entries.remove(name);
    }

    /// Number of names with cached labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NamespaceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceCache")
            .field("entries", &self.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NamespaceLookup for NamespaceCache {
    async fn namespace_labels(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        self.labels(name).await
    }
}

/// Namespace context of a candidate object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    /// Labels of the object's namespace (or its own, for a Namespace).
    Labels(Labels),
    /// Cluster-scoped object; no namespace selector can match it.
    NotNamespaced,
}

/// Resolve the labels of the namespace `object` lives in.
///
/// # Errors
///
/// - [`EvalError::NoMetadata`] if the object has no metadata view.
/// - [`EvalError::NoKind`] if its kind is absent or empty.
/// - [`EvalError::CacheLookup`] if the namespace cannot be fetched or does
///   not exist.
pub async fn resolve_namespace_labels(
    object: &CandidateObject<'_>,
    lookup: &dyn NamespaceLookup,
) -> Result<NamespaceScope, EvalError> {
    let meta = object.meta().ok_or(EvalError::NoMetadata)?;
    let kind = meta
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(EvalError::NoKind)?;

    if kind == "Namespace" {
        return Ok(NamespaceScope::Labels(meta.labels.clone()));
    }
    if meta.namespace.is_empty() {
        return Ok(NamespaceScope::NotNamespaced);
    }

    match lookup.namespace_labels(&meta.namespace).await {
        Ok(Some(labels)) => Ok(NamespaceScope::Labels(labels)),
        Ok(None) => Err(EvalError::CacheLookup {
            namespace: meta.namespace.clone(),
            message: "namespace not found".to_owned(),
        }),
        Err(err) => Err(EvalError::CacheLookup {
            namespace: meta.namespace.clone(),
            message: err.to_string(),
        }),
    }
}
