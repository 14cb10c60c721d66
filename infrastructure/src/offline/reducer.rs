//! Deterministic reducer: merges bullet points without a model.
//!
//! Every `- ` line of every contribution is a point. Points are deduplicated
//! in contribution order, grouped into clusters by the text before their
//! first `:`, and the first `max_key_points` become key points.

use async_trait::async_trait;
use sixhats_application::{AggregationError, ReductionPort};
use sixhats_domain::{Cluster, Contribution, Role, Scenario, SynthesisDraft};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct OfflineReducer {
    max_key_points: usize,
}

impl Default for OfflineReducer {
    fn default() -> Self {
        Self { max_key_points: 5 }
    }
}

impl OfflineReducer {
    pub fn new(max_key_points: usize) -> Self {
        Self { max_key_points }
    }
}

fn points(contributions: &[Contribution]) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    for line in contributions.iter().flat_map(|c| c.content.lines()) {
        let Some(point) = line.trim().strip_prefix("- ") else {
            continue;
        };
        let point = point.trim();
        if !point.is_empty() && !seen.iter().any(|p| p == point) {
            seen.push(point.to_string());
        }
    }
    seen
}

fn clusters(points: &[String]) -> Vec<Cluster> {
    let mut themes: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for point in points {
        let theme = point.split_once(':').map(|(t, _)| t.trim()).unwrap_or("General");
        themes.entry(theme).or_default().push(point.clone());
    }
    themes
        .into_iter()
        .map(|(theme, points)| Cluster {
            theme: theme.to_string(),
            points,
        })
        .collect()
}

#[async_trait]
impl ReductionPort for OfflineReducer {
    async fn reduce(
        &self,
        role: &Role,
        scenario: &Scenario,
        contributions: &[Contribution],
    ) -> Result<SynthesisDraft, AggregationError> {
        let points = points(contributions);
        if points.is_empty() {
            return Err(AggregationError::Unparsable(format!(
                "no bullet points in {} contribution(s)",
                contributions.len()
            )));
        }

        let confidences: Vec<f64> = contributions.iter().filter_map(|c| c.confidence).collect();
        let confidence = if confidences.is_empty() {
            0.5
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        let mut draft = SynthesisDraft::new(format!(
            "{} on '{}': {} distinct point(s) from {} contribution(s).",
            role.display_name(),
            scenario.title,
            points.len(),
            contributions.len()
        ))
        .with_key_points(points.iter().take(self.max_key_points).cloned().collect())
        .with_confidence(confidence);
        draft.clusters = clusters(&points);
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sixhats_domain::AgentInfo;

    fn contribution(agent: &str, content: &str) -> Contribution {
        Contribution::new(Role::Black, AgentInfo::new(agent, "Critic"), content)
    }

    #[tokio::test]
    async fn test_merges_and_dedupes_points() {
        let input = vec![
            contribution("a", "Critic\n- Risk: outage\n- Cost: licences"),
            contribution("b", "Critic\n- Risk: outage\n- Risk: hiring"),
        ];
        let draft = OfflineReducer::default()
            .reduce(&Role::Black, &Scenario::new("T", "P"), &input)
            .await
            .unwrap();

        assert_eq!(
            draft.key_points,
            vec!["Risk: outage", "Cost: licences", "Risk: hiring"]
        );
        assert_eq!(draft.clusters.len(), 2);
        assert_eq!(draft.clusters[1].theme, "Risk");
        assert_eq!(draft.clusters[1].points.len(), 2);
        assert!(draft.summary.contains("3 distinct point(s) from 2 contribution(s)"));
        assert!(draft.defect().is_none());
    }

    #[tokio::test]
    async fn test_free_text_is_unparsable() {
        let err = OfflineReducer::default()
            .reduce(
                &Role::Red,
                &Scenario::new("T", "P"),
                &[contribution("a", "just a feeling")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AggregationError::Unparsable(_)));
    }
}
