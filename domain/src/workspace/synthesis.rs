//! Synthesis - the aggregated reduction of one phase's contributions.
//!
//! Two constructors matter:
//! - [`Synthesis::from_draft`] wraps a successful reduction
//! - [`Synthesis::fallback`] builds the degraded, zero-confidence synthesis
//!   used when the reduction fails, so a phase that received contributions
//!   always ends up with something downstream consumers can read

use super::contribution::Contribution;
use crate::core::ids::new_id;
use crate::core::string::{first_meaningful_line, truncate};
use crate::protocol::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix every fallback summary starts with
pub const FALLBACK_MARKER: &str = "[FALLBACK]";

/// Default bound on key points lifted from raw contributions in a fallback
pub const DEFAULT_FALLBACK_KEY_POINTS: usize = 5;

const KEY_POINT_MAX_LEN: usize = 200;

/// A group of related points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub theme: String,
    #[serde(default)]
    pub points: Vec<String>,
}

/// Output of the external reduction step, before it is wrapped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisDraft {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub contradictions: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl SynthesisDraft {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn with_key_points(mut self, points: Vec<String>) -> Self {
        self.key_points = points;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Reason this draft cannot be used, if any
    pub fn defect(&self) -> Option<String> {
        if self.summary.trim().is_empty() {
            return Some("reduction returned an empty summary".to_string());
        }
        match self.confidence {
            Some(c) if !c.is_finite() => {
                Some(format!("reduction returned non-finite confidence {c}"))
            }
            _ => None,
        }
    }
}

/// Aggregated synthesis of a phase's contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub synthesis_id: String,
    pub role: Role,
    pub summary: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub contradictions: Vec<String>,
    pub confidence: f64,
    pub derived_from: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl Synthesis {
    /// Wrap a successful reduction. `derived_from` is exactly the input ids.
    pub fn from_draft(role: Role, draft: SynthesisDraft, contributions: &[Contribution]) -> Self {
        let confidence = draft.confidence.unwrap_or(1.0).clamp(0.0, 1.0);
        Self {
            synthesis_id: new_id(),
            role,
            summary: draft.summary,
            key_points: draft.key_points,
            clusters: draft.clusters,
            contradictions: draft.contradictions,
            confidence,
            derived_from: ids_of(contributions),
            fallback: false,
            created_at: Utc::now(),
        }
    }

    /// Degraded synthesis for a failed reduction.
    ///
    /// Key points are the first meaningful line of each of the first
    /// `max_key_points` contributions.
    pub fn fallback(
        role: Role,
        contributions: &[Contribution],
        max_key_points: usize,
        reason: &str,
    ) -> Self {
        let key_points = contributions
            .iter()
            .filter_map(|c| first_meaningful_line(&c.content))
            .take(max_key_points)
            .map(|line| truncate(line, KEY_POINT_MAX_LEN))
            .collect();

        Self {
            synthesis_id: new_id(),
            summary: format!(
                "{FALLBACK_MARKER} Aggregation failed for {} ({reason}); key points are taken verbatim from {} raw contribution(s).",
                role.display_name(),
                contributions.len()
            ),
            role,
            key_points,
            clusters: Vec::new(),
            contradictions: Vec::new(),
            confidence: 0.0,
            derived_from: ids_of(contributions),
            fallback: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

fn ids_of(contributions: &[Contribution]) -> Vec<String> {
    contributions
        .iter()
        .map(|c| c.contribution_id.clone())
        .collect()
}
