//! End-to-end tests: producer embeds, consumer decodes, merges and resolves

mod common;

use common::{embed_artifact, init_test_logging, library_unit};
use expander_core::codec;
use expander_core::config::ExpanderConfig;
use expander_core::embed::{load_catalogues, ArtifactMetadata, EMBEDDED_SOURCE_COMPRESSED_KEY};
use expander_core::{
    Catalogue, CatalogueIndex, ExpanderError, MatchMode, ProducerVersion, Registry, Seed,
    SourceUnit,
};
use pretty_assertions::assert_eq;

#[test]
fn test_encode_decode_resolve_restore() {
    init_test_logging();

    let units = vec![
        SourceUnit::new("P>A.cs", "class A{}").with_dependencies(["P>B.cs"]),
        SourceUnit::new("P>B.cs", "class B{}"),
    ];

    let decoded = codec::decode(&codec::encode(&units).unwrap()).unwrap();
    assert_eq!(decoded, units);

    let catalogue = Catalogue::new("P", ProducerVersion::new(1, 0, 0), decoded).unwrap();
    let index = CatalogueIndex::build([&catalogue]).unwrap();
    let resolution = index.resolve(&Seed::keys(["P>A.cs"]));

    assert_eq!(resolution.keys(), vec!["P>A.cs", "P>B.cs"]);
    assert_eq!(
        resolution.restored(),
        vec!["class A{}".to_string(), "class B{}".to_string()]
    );
}

#[test]
fn test_two_producers_through_artifacts() {
    init_test_logging();

    let collections = embed_artifact(
        "Collections",
        vec![
            library_unit("Collections", "Deque.cs", "Deque", &[]),
            library_unit("Collections", "PriorityQueue.cs", "PriorityQueue", &["Deque.cs"]),
        ],
    );
    let graph = embed_artifact(
        "Graph",
        vec![
            library_unit("Graph", "Dijkstra.cs", "Dijkstra", &[])
                .with_dependencies(["CollectionsᐳPriorityQueue.cs", "GraphᐳEdge.cs"]),
            library_unit("Graph", "Edge.cs", "Edge", &[]),
        ],
    );

    let report = load_catalogues([&collections, &graph], &ExpanderConfig::default());
    assert!(!report.has_warnings());
    let index = report.build_index().unwrap();

    let resolution = index.resolve(&Seed::names(["Dijkstra"], MatchMode::SimpleName));
    assert_eq!(
        resolution.keys(),
        vec![
            "GraphᐳDijkstra.cs",
            "CollectionsᐳPriorityQueue.cs",
            "GraphᐳEdge.cs",
            "CollectionsᐳDeque.cs",
        ]
    );
    assert!(resolution.unresolved().is_empty());

    let rendered = resolution.render();
    assert!(rendered.starts_with("using System;\n"));
    assert_eq!(rendered.matches("using System;").count(), 1);
}

#[test]
fn test_corrupt_producer_does_not_block_others() {
    init_test_logging();

    let good = embed_artifact("Good", vec![library_unit("Good", "A.cs", "A", &[])]);
    let mut broken = embed_artifact("Broken", vec![library_unit("Broken", "B.cs", "B", &[])]);
    let blob = broken.attributes[EMBEDDED_SOURCE_COMPRESSED_KEY].clone();
    let truncated: String = blob.chars().take(blob.chars().count() / 2).collect();
    broken
        .attributes
        .insert(EMBEDDED_SOURCE_COMPRESSED_KEY.to_string(), truncated);

    let report = load_catalogues([&broken, &good], &ExpanderConfig::default());

    assert_eq!(report.catalogues.len(), 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].producer, "Broken");
    assert!(!report.has_errors());
}

#[test]
fn test_duplicate_keys_across_producers_abort_index() {
    init_test_logging();

    let left = embed_artifact("Left", vec![SourceUnit::new("X.cs", "class X {}")]);
    let right = embed_artifact("Right", vec![SourceUnit::new("X.cs", "class X {}")]);

    let report = load_catalogues([&left, &right], &ExpanderConfig::default());
    assert_eq!(report.catalogues.len(), 2);

    match report.build_index() {
        Err(ExpanderError::DuplicateKey { key, first, second }) => {
            assert_eq!(key, "X.cs");
            assert!(first.starts_with("Left@"));
            assert!(second.starts_with("Right@"));
        }
        other => panic!("expected duplicate key error, got {other:?}"),
    }
}

#[test]
fn test_registry_session() {
    init_test_logging();

    let registry = Registry::new();
    registry.register_artifact(embed_artifact(
        "Math",
        vec![
            library_unit("Math", "ModInt.cs", "ModInt", &[]),
            library_unit("Math", "Combination.cs", "Combination", &["ModInt.cs"]),
        ],
    ));
    registry.register(|| SourceUnit::new("LocalᐳProgram.cs", "class Program {}"));
    registry.register_artifact(ArtifactMetadata::new("NothingEmbedded"));

    let keys: Vec<&str> = registry.enumerate().map(|unit| unit.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["MathᐳCombination.cs", "MathᐳModInt.cs", "LocalᐳProgram.cs"]
    );

    // Frozen: late producers never surface.
    registry.register(|| SourceUnit::new("LateᐳLate.cs", ""));
    assert_eq!(registry.enumerate().count(), 3);

    let index = registry.build_index().unwrap();
    let resolution = index.resolve(&Seed::names(["Math.Combination"], MatchMode::Exact));
    assert_eq!(
        resolution.keys(),
        vec!["MathᐳCombination.cs", "MathᐳModInt.cs"]
    );
}
