use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graffiti::{flatten, CandidateObject, Labels, RuleSet, RuleSetBuilder};

const DEPLOYMENT: &[u8] = br#"{
    "kind": "Deployment",
    "metadata": {
        "name": "nginx",
        "namespace": "shop",
        "labels": {"app": "web", "tier": "front"},
        "annotations": {"deployment.kubernetes.io/revision": "1"}
    },
    "spec": {
        "replicas": 3,
        "template": {"spec": {"containers": [{"name": "nginx", "image": "nginx:1.27"}]}}
    }
}"#;

/// Build a rule set with `n` rules, each using label, field and namespace
/// selectors plus a templated annotation.
fn build_ruleset(n: usize) -> RuleSet {
    let mut builder = RuleSetBuilder::new();
    for i in 0..n {
        builder = builder.rule(&format!("r{i}"), move |r| {
            r.label_selector(&format!("app=app-{i}"))
                .label_selector("app=web")
                .field_selector("spec.template.spec.containers.0.image=nginx:1.27")
                .namespace_selector("team=shop")
                .label(&format!("painted-{i}"), "true")
                .annotation("example.com/owner", "{{ .metadata.name }}")
        });
    }
    builder.compile().unwrap()
}

fn namespaces() -> BTreeMap<String, Labels> {
    [(
        "shop".to_owned(),
        [("team".to_owned(), "shop".to_owned())].into(),
    )]
    .into_iter()
    .collect()
}

fn bench_apply(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let lookup = namespaces();
    let mut group = c.benchmark_group("apply");

    for &n in &[1, 10, 50] {
        let ruleset = build_ruleset(n);
        group.bench_function(format!("{n}_rules"), |b| {
            b.to_async(&runtime).iter(|| async {
                let object = CandidateObject::from_json(black_box(DEPLOYMENT)).unwrap();
                ruleset.apply(&object, &lookup).await
            });
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    c.bench_function("flatten_deployment", |b| {
        b.iter(|| flatten(black_box(DEPLOYMENT)));
    });
}

criterion_group!(benches, bench_apply, bench_flatten);
criterion_main!(benches);
