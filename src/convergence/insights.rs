//! Lightweight insights extracted from detected chains

use super::types::{ChainId, ConvergenceChain};
use crate::document::{Document, DocumentId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What an insight says about its chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightKind {
    /// Categories carried by every member of the chain
    SharedTheme { categories: Vec<String> },
    /// How often each category occurs across members, most frequent first
    DominantCategories { counts: Vec<(String, usize)> },
    /// A member whose categories the rest of the chain does not carry
    CrossCategoryBridge {
        document: DocumentId,
        categories: Vec<String>,
    },
    /// Chain strength reached the strong-convergence level
    StrongConvergence {
        representative: DocumentId,
        strength: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub chain_id: ChainId,
    #[serde(flatten)]
    pub kind: InsightKind,
    pub description: String,
}

/// Derive insights for one chain.
///
/// `documents` maps ids to the analyzed documents; members missing from it
/// contribute no categories.
pub fn extract_insights(
    chain: &ConvergenceChain,
    documents: &HashMap<&DocumentId, &Document>,
    strong_convergence: f32,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let member_categories: Vec<(&DocumentId, &BTreeSet<String>)> = chain
        .participants
        .iter()
        .filter_map(|id| documents.get(id).map(|doc| (id, &doc.categories)))
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, categories) in &member_categories {
        for category in categories.iter() {
            *counts.entry(category.as_str()).or_default() += 1;
        }
    }

    let shared: Vec<String> = counts
        .iter()
        .filter(|(_, &n)| n == chain.len())
        .map(|(c, _)| c.to_string())
        .collect();
    if !shared.is_empty() {
        insights.push(Insight {
            chain_id: chain.id.clone(),
            description: format!(
                "{} documents converge on {}",
                chain.len(),
                shared.join(", ")
            ),
            kind: InsightKind::SharedTheme { categories: shared },
        });
    }

    if !counts.is_empty() {
        let mut ranked: Vec<(String, usize)> =
            counts.iter().map(|(c, n)| (c.to_string(), *n)).collect();
        // Stable sort keeps alphabetical order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        insights.push(Insight {
            chain_id: chain.id.clone(),
            description: format!("dominant category: {} ({})", ranked[0].0, ranked[0].1),
            kind: InsightKind::DominantCategories { counts: ranked },
        });
    }

    // Bridges only make sense when the chain spans more than one category
    if counts.len() > 1 {
        for (id, categories) in &member_categories {
            if categories.is_empty() {
                continue;
            }
            let carried_elsewhere = member_categories
                .iter()
                .filter(|(other, _)| other != id)
                .any(|(_, other_categories)| !other_categories.is_disjoint(categories));
            if !carried_elsewhere {
                let categories: Vec<String> = categories.iter().cloned().collect();
                insights.push(Insight {
                    chain_id: chain.id.clone(),
                    description: format!(
                        "{} bridges {} into the chain",
                        id,
                        categories.join(", ")
                    ),
                    kind: InsightKind::CrossCategoryBridge {
                        document: (*id).clone(),
                        categories,
                    },
                });
            }
        }
    }

    if chain.strength >= strong_convergence {
        insights.push(Insight {
            chain_id: chain.id.clone(),
            description: format!(
                "strong convergence ({:.2}) around {}",
                chain.strength, chain.representative
            ),
            kind: InsightKind::StrongConvergence {
                representative: chain.representative.clone(),
                strength: chain.strength,
            },
        });
    }

    insights
}
