use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graffiti::{
    CandidateObject, Decision, EvalError, FetchError, Labels, NamespaceCache, NamespaceFetcher,
    RuleSetBuilder,
};

/// Counts fetches and answers after a delay, so concurrent misses overlap.
struct SlowFetcher {
    calls: AtomicUsize,
    delay: Duration,
}

impl SlowFetcher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamespaceFetcher for SlowFetcher {
    async fn fetch_namespace(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match name {
            "flaky" => Err(FetchError::Failed {
                namespace: name.to_owned(),
                message: "connection reset".to_owned(),
            }),
            _ => Ok(Some(
                [("team".to_owned(), name.to_owned())].into_iter().collect(),
            )),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_share_one_fetch() {
    let fetcher = SlowFetcher::new(Duration::from_millis(50));
    let cache = Arc::new(NamespaceCache::with_default_timeout(fetcher.clone()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move { cache.labels("shop").await }));
    }
    for handle in handles {
        let labels = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(labels["team"], "shop");
    }

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_namespaces_fetch_independently() {
    let fetcher = SlowFetcher::new(Duration::from_millis(10));
    let cache = Arc::new(NamespaceCache::with_default_timeout(fetcher.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = Arc::clone(&cache);
        let name = format!("ns-{}", i % 4);
        handles.push(tokio::spawn(async move { cache.labels(&name).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_some());
    }

    assert_eq!(fetcher.calls(), 4);
    assert_eq!(cache.len(), 4);
}

#[tokio::test]
async fn slow_fetch_times_out() {
    let fetcher = SlowFetcher::new(Duration::from_secs(10));
    let cache = NamespaceCache::new(fetcher.clone(), Duration::from_millis(20));

    let err = cache.labels("shop").await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Timeout {
            namespace: "shop".into(),
            timeout: Duration::from_millis(20),
        }
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn failures_are_retried() {
    let fetcher = SlowFetcher::new(Duration::ZERO);
    let cache = NamespaceCache::with_default_timeout(fetcher.clone());

    assert!(cache.labels("flaky").await.is_err());
    assert!(cache.labels("flaky").await.is_err());
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn timeout_surfaces_as_evaluation_error() {
    let fetcher = SlowFetcher::new(Duration::from_secs(10));
    let cache = NamespaceCache::new(fetcher, Duration::from_millis(20));
    let ruleset = RuleSetBuilder::new()
        .rule("shop", |r| r.namespace_selector("team=shop").label("painted", "yes"))
        .compile()
        .unwrap();

    let raw = br#"{"kind": "Pod", "metadata": {"name": "web", "namespace": "shop"}}"#;
    let object = CandidateObject::from_json(raw).unwrap();
    let verdicts = ruleset.apply(&object, &cache).await;
    assert!(matches!(
        verdicts[0].decision(),
        Decision::Error(EvalError::CacheLookup { namespace, .. }) if namespace == "shop"
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rule_set_shared_across_tasks() {
    let fetcher = SlowFetcher::new(Duration::from_millis(5));
    let cache = Arc::new(NamespaceCache::with_default_timeout(fetcher.clone()));
    let ruleset = Arc::new(
        RuleSetBuilder::new()
            .rule("shop", |r| {
                r.namespace_selector("team=shop")
                    .label("owner", "{{ .metadata.name }}")
            })
            .compile()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..12 {
        let cache = Arc::clone(&cache);
        let ruleset = Arc::clone(&ruleset);
        let namespace = if i % 2 == 0 { "shop" } else { "ops" };
        handles.push(tokio::spawn(async move {
            let raw = format!(
                r#"{{"kind": "Pod", "metadata": {{"name": "pod-{i}", "namespace": "{namespace}"}}}}"#
            );
            let object = CandidateObject::from_json(raw.as_bytes()).unwrap();
            let verdicts = ruleset.apply(&object, cache.as_ref()).await;
            (i, verdicts[0].decision().clone())
        }));
    }

    for handle in handles {
        let (i, decision) = handle.await.unwrap();
        if i % 2 == 0 {
            let patch = decision.patch().unwrap();
            assert_eq!(patch.operations()[0].value["owner"], format!("pod-{i}"));
        } else {
            assert_eq!(decision, Decision::NoMatch);
        }
    }
    assert_eq!(fetcher.calls(), 2);
}
