//! Structural walker benchmarks
//!
//! Run:
//!   cargo bench --bench walker_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use octofhir_shapecheck::{
    CacheConfig, CachedSchemaProvider, InMemorySchemaProvider, SchemaNode, SchemaProvider,
    StructuralWalker,
};
use serde_json::{Value as JsonValue, json};
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn create_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn schemas() -> InMemorySchemaProvider {
    InMemorySchemaProvider::new()
        .with_schema(
            SchemaNode::root("Patient")
                .with_child(SchemaNode::element("identifier", "Identifier").repeating())
                .with_child(SchemaNode::element("active", "boolean"))
                .with_child(SchemaNode::element("name", "HumanName").repeating())
                .with_child(SchemaNode::element("gender", "code"))
                .with_child(SchemaNode::element("birthDate", "date"))
                .with_child(
                    SchemaNode::element("contact", "")
                        .backbone()
                        .repeating()
                        .with_child(SchemaNode::element("name", "HumanName"))
                        .with_child(SchemaNode::element("gender", "code")),
                ),
        )
        .with_schema(
            SchemaNode::root("HumanName")
                .with_child(SchemaNode::element("use", "code"))
                .with_child(SchemaNode::element("family", "string"))
                .with_child(SchemaNode::element("given", "string").repeating())
                .with_child(SchemaNode::element("period", "Period")),
        )
        .with_schema(
            SchemaNode::root("Identifier")
                .with_child(SchemaNode::element("system", "uri"))
                .with_child(SchemaNode::element("value", "string").required()),
        )
        .with_schema(
            SchemaNode::root("Period")
                .with_child(SchemaNode::element("start", "dateTime"))
                .with_child(SchemaNode::element("end", "dateTime")),
        )
}

fn patient(i: usize) -> JsonValue {
    json!({
        "resourceType": "Patient",
        "id": format!("p{i}"),
        "identifier": [{ "system": "http://hospital.example.org", "value": format!("{i}") }],
        "active": if i % 7 == 0 { json!("true") } else { json!(true) },
        "name": [{
            "use": "official",
            "family": "Chalmers",
            "given": ["Peter", "James"],
            "period": { "start": "2001-01-01T00:00:00Z" }
        }],
        "gender": "male",
        "birthDate": if i % 5 == 0 { "1974-02-30" } else { "1974-12-25" },
        "contact": [{ "name": { "family": "du Marche" }, "gender": "female" }]
    })
}

fn bundle_with_resources(count: usize) -> String {
    let entries: Vec<JsonValue> = (0..count)
        .map(|i| json!({ "resource": patient(i) }))
        .collect();
    json!({ "resourceType": "Bundle", "type": "collection", "entry": entries }).to_string()
}

/// Benchmark: bundle validation with varying sizes
fn bench_validate_bundle(c: &mut Criterion) {
    let rt = create_runtime();
    let walker = StructuralWalker::with_provider(Arc::new(schemas()));

    let mut group = c.benchmark_group("validate_bundle");

    for count in [1, 10, 100, 1000].iter() {
        let bundle = bundle_with_resources(*count);

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bundle, |b, bundle| {
            b.to_async(&rt)
                .iter(|| async { walker.validate(black_box(bundle), "R4").await });
        });
    }

    group.finish();
}

/// Benchmark: cached provider in front of the walker
fn bench_cached_provider(c: &mut Criterion) {
    let rt = create_runtime();
    let provider: Arc<dyn SchemaProvider> = Arc::new(CachedSchemaProvider::new(
        Arc::new(schemas()),
        CacheConfig::default(),
    ));
    let walker = StructuralWalker::with_provider(provider);
    let bundle = bundle_with_resources(100);

    c.bench_function("validate_bundle_cached_provider", |b| {
        b.to_async(&rt)
            .iter(|| async { walker.validate(black_box(&bundle), "R4").await });
    });
}

/// Benchmark: parse failures short-circuit
fn bench_invalid_input(c: &mut Criterion) {
    let rt = create_runtime();
    let walker = StructuralWalker::with_provider(Arc::new(schemas()));
    let bundle = bundle_with_resources(10);
    let truncated = &bundle[..512];

    c.bench_function("validate_truncated_document", |b| {
        b.iter(|| rt.block_on(walker.validate(black_box(truncated), "R4")));
    });
}

criterion_group!(
    benches,
    bench_validate_bundle,
    bench_cached_provider,
    bench_invalid_input
);
criterion_main!(benches);
