//! Deterministic agent that reasons over the scenario text alone.
//!
//! Each hat reads a different part of the scenario: white lists what is
//! stated, black turns assumptions and constraints into risks, yellow turns
//! objectives into benefits, and so on. The output depends only on the
//! role, the agent and the scenario, so reruns are reproducible.

use async_trait::async_trait;
use serde_json::json;
use sixhats_application::{AgentError, AgentPort, PhaseContext};
use sixhats_domain::{AgentInfo, ContributionDraft, Role, Scenario};
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct OfflineAgent;

impl OfflineAgent {
    pub fn new() -> Self {
        Self
    }

    fn points(role: &Role, scenario: &Scenario, context: &PhaseContext) -> Vec<String> {
        let bullets = |prefix: &str, items: &[String]| -> Vec<String> {
            items.iter().map(|i| format!("{prefix}{i}")).collect()
        };

        let mut points = match role {
            Role::White => {
                let mut facts = vec![format!("Question under review: {}", scenario.problem_statement)];
                if !scenario.context.is_empty() {
                    facts.push(format!("Stated context: {}", scenario.context));
                }
                facts.extend(bullets("Known constraint: ", &scenario.constraints));
                facts.extend(
                    scenario
                        .inputs
                        .documents
                        .iter()
                        .map(|d| format!("Supporting document: {d}")),
                );
                facts
            }
            Role::Red => vec![
                format!("First reaction to '{}' is cautious interest", scenario.title),
                "Stakeholders are likely to feel the cost of change before its benefit".to_string(),
            ],
            Role::Black => {
                let mut risks = bullets("Risk if this does not hold: ", &scenario.assumptions);
                risks.extend(bullets("Risk of breaching constraint: ", &scenario.constraints));
                if risks.is_empty() {
                    risks.push("Risk: no assumptions are stated, so none can be tested".to_string());
                }
                risks
            }
            Role::Yellow => {
                let mut benefits = bullets("Benefit if achieved: ", &scenario.objectives);
                if benefits.is_empty() {
                    benefits.push(format!("Benefit: resolving '{}' removes an open question", scenario.title));
                }
                benefits
            }
            Role::Green => {
                let mut ideas = vec![format!("Alternative: pilot '{}' on a narrow scope first", scenario.title)];
                ideas.extend(
                    scenario
                        .constraints
                        .iter()
                        .map(|c| format!("Alternative: design around '{c}' instead of relaxing it")),
                );
                ideas
            }
            Role::Blue => {
                let mut process = vec![format!(
                    "Process: {} earlier phase(s) reached a synthesis",
                    context.prior_syntheses.len()
                )];
                process.extend(
                    context
                        .prior_syntheses
                        .iter()
                        .map(|s| format!("From {}: {}", s.role.display_name(), s.summary)),
                );
                process.extend(bullets("Decide against criterion: ", &scenario.success_criteria));
                process
            }
            Role::Custom(name) => vec![format!("{name} view on: {}", scenario.problem_statement)],
        };

        if points.is_empty() {
            points.push(format!("No {} input found in the scenario", role.display_name()));
        }
        points
    }
}

#[async_trait]
impl AgentPort for OfflineAgent {
    async fn invoke(
        &self,
        role: &Role,
        agent: &AgentInfo,
        scenario: &Scenario,
        context: &PhaseContext,
    ) -> Result<ContributionDraft, AgentError> {
        let points = Self::points(role, scenario, context);
        let content = std::iter::once(format!("{} ({})", agent.persona, role.display_name()))
            .chain(points.iter().map(|p| format!("- {p}")))
            .collect::<Vec<_>>()
            .join("\n");

        let input_tokens = scenario.to_markdown().split_whitespace().count() as u64;
        let output_tokens = content.split_whitespace().count() as u64;
        debug!(role = %role, agent = %agent.agent_id, points = points.len(), "Offline contribution");

        Ok(ContributionDraft::new(content)
            .with_structured(json!({ "points": points }))
            .with_tokens(input_tokens, output_tokens)
            .with_confidence(0.5)
            .with_tag("offline"))
    }
}
