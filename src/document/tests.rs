//! Serialization tests with fixtures shaped like discovery output

use super::*;
use crate::convergence::ChainId;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

fn discovered_document_fixture() -> Value {
    json!({
        "id": "notes/2024-03-architecture.md",
        "content": "Event sourcing decision record",
        "embedding": [0.1, 0.2, 0.3],
        "categories": ["architecture", "decisions"],
        "analysis_type": "breakthrough_tecnico",
        "source_file": "notes/2024-03-architecture.md",
        "created_at": "2024-03-01T09:00:00Z"
    })
}

#[test]
fn document_deserializes_from_discovery_output() {
    let doc: Document = serde_json::from_value(discovered_document_fixture()).unwrap();

    assert_eq!(doc.id.as_str(), "notes/2024-03-architecture.md");
    assert_eq!(doc.embedding_dimension(), Some(3));
    assert!(doc.categories.contains("architecture"));
    assert_eq!(doc.analysis_type.as_deref(), Some("breakthrough_tecnico"));
    assert!(!doc.is_enriched());
}

#[test]
fn document_without_optional_fields_deserializes() {
    let doc: Document = serde_json::from_value(json!({ "id": "bare" })).unwrap();

    assert!(doc.embedding.is_none());
    assert!(doc.categories.is_empty());
    assert!(doc.created_at.is_none());
    assert!(doc.last_touched().is_none());
}

#[test]
fn last_touched_prefers_latest_timestamp() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let modified = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let doc = Document::new("a", "")
        .with_created_at(created)
        .with_modified_at(modified);

    assert_eq!(doc.last_touched(), Some(modified));
}

#[test]
fn categories_are_a_set() {
    let mut doc = Document::new("a", "").with_categories(["x", "y"]);
    assert!(!doc.add_category("x"));
    assert!(doc.add_category("z"));
    assert!(doc.remove_category("y"));
    assert_eq!(doc.categories.len(), 2);
}

#[test]
fn enriched_metadata_uses_snake_case_enums() {
    let metadata = EnrichedMetadata {
        convergence_score: 86.0,
        impact_score: 60.0,
        intelligence_score: 73.0,
        intelligence_type: IntelligenceType::KnowledgeHub,
        breakthroughs: vec![Breakthrough {
            kind: BreakthroughKind::StrongConvergence,
            chain_id: ChainId::from_string("chain-1"),
            description: "tight chain".into(),
        }],
        chain_ids: vec![ChainId::from_string("chain-1")],
        centrality: 1.0,
        enrichment_level: EnrichmentLevel::Convergent,
        failure: None,
    };

    let value = serde_json::to_value(&metadata).unwrap();
    assert_eq!(value["intelligence_type"], "knowledge_hub");
    assert_eq!(value["enrichment_level"], "convergent");
    assert_eq!(value["breakthroughs"][0]["kind"], "strong_convergence");
    assert!(value.get("failure").is_none());

    let back: EnrichedMetadata = serde_json::from_value(value).unwrap();
    assert_eq!(back, metadata);
}

#[test]
fn degraded_metadata_is_zeroed() {
    let metadata = EnrichedMetadata::degraded("missing embedding");
    assert!(metadata.is_degraded());
    assert_eq!(metadata.convergence_score, 0.0);
    assert_eq!(metadata.intelligence_type, IntelligenceType::KnowledgePiece);
    assert_eq!(metadata.failure.as_deref(), Some("missing embedding"));
}

#[test]
fn normalize_score_clamps_and_drops_nan() {
    assert_eq!(normalize_score(-3.0), 0.0);
    assert_eq!(normalize_score(250.0), MAX_SCORE);
    assert_eq!(normalize_score(f64::NAN), 0.0);
    assert_eq!(normalize_score(42.5), 42.5);
}
