use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use graffiti::{
    AdmissionOutcome, CandidateObject, FetchError, Labels, NamespaceCache, NamespaceFetcher,
    RuleSet,
};

const RULES: &str = r#"
rules:
  - name: shop-owner
    matchers:
      label-selectors: ["app=web"]
      namespace-selector: "team=shop"
    payload:
      labels:
        example.com/painted: "true"
      annotations:
        example.com/owner: "{{ .metadata.name }}"
"#;

/// Stands in for the cluster API.
struct StaticNamespaces(BTreeMap<String, Labels>);

#[async_trait]
impl NamespaceFetcher for StaticNamespaces {
    async fn fetch_namespace(&self, name: &str) -> Result<Option<Labels>, FetchError> {
        Ok(self.0.get(name).cloned())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ruleset = RuleSet::from_yaml(RULES)?;
    println!("Loaded {ruleset}");

    let namespaces = StaticNamespaces(
        [(
            "shop".to_owned(),
            [("team".to_owned(), "shop".to_owned())].into(),
        )]
        .into_iter()
        .collect(),
    );
    let cache = NamespaceCache::with_default_timeout(Arc::new(namespaces));

    let raw = br#"{
        "kind": "Deployment",
        "metadata": {"name": "storefront", "namespace": "shop", "labels": {"app": "web"}}
    }"#;
    let object = CandidateObject::from_json(raw)?;

    for verdict in ruleset.apply(&object, &cache).await {
        println!("{verdict}");
        let review = AdmissionOutcome::from_decision("demo-uid", verdict.decision()).into_review();
        println!("{}", serde_json::to_string_pretty(&review)?);
    }
    Ok(())
}
