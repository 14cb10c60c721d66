//! Cross-phase artifacts: decisions, action items, open questions.
//!
//! Every artifact carries `based_on`, the contribution or synthesis ids it
//! was derived from. The workspace refuses an artifact whose provenance is
//! empty or does not resolve.

use crate::core::ids::new_id;
use crate::protocol::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority shared by action items and open questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A decision made during or after the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: String,
    pub statement: String,
    pub rationale: String,
    pub based_on: Vec<String>,
    /// "human" or the automated actor that made it
    pub made_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(
        statement: impl Into<String>,
        rationale: impl Into<String>,
        made_by: impl Into<String>,
        based_on: Vec<String>,
    ) -> Self {
        Self {
            decision_id: new_id(),
            statement: statement.into(),
            rationale: rationale.into(),
            based_on,
            made_by: made_by.into(),
            confidence: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// Status of an action item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

/// An action item derived from the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub action_id: String,
    pub task: String,
    pub owner: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_by: Option<DateTime<Utc>>,
    pub origin_role: Role,
    pub based_on: Vec<String>,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
}

impl ActionItem {
    pub fn new(task: impl Into<String>, origin_role: Role, based_on: Vec<String>) -> Self {
        Self {
            action_id: new_id(),
            task: task.into(),
            owner: "unassigned".to_string(),
            priority: Priority::default(),
            due_by: None,
            origin_role,
            based_on,
            status: ActionStatus::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_by(mut self, due_by: DateTime<Utc>) -> Self {
        self.due_by = Some(due_by);
        self
    }
}

/// A question that remains unanswered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question_id: String,
    pub question: String,
    pub origin_role: Role,
    pub priority: Priority,
    pub based_on: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl OpenQuestion {
    pub fn new(question: impl Into<String>, origin_role: Role, based_on: Vec<String>) -> Self {
        Self {
            question_id: new_id(),
            question: question.into(),
            origin_role,
            priority: Priority::default(),
            based_on,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Any artifact, for code that handles them uniformly
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Decision(Decision),
    ActionItem(ActionItem),
    OpenQuestion(OpenQuestion),
}

impl Artifact {
    pub fn id(&self) -> &str {
        match self {
            Artifact::Decision(d) => &d.decision_id,
            Artifact::ActionItem(a) => &a.action_id,
            Artifact::OpenQuestion(q) => &q.question_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Decision(_) => "decision",
            Artifact::ActionItem(_) => "action_item",
            Artifact::OpenQuestion(_) => "open_question",
        }
    }

    pub fn based_on(&self) -> &[String] {
        match self {
            Artifact::Decision(d) => &d.based_on,
            Artifact::ActionItem(a) => &a.based_on,
            Artifact::OpenQuestion(q) => &q.based_on,
        }
    }
}

/// Cross-phase outputs of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifacts {
    pub global_summary: Option<String>,
    pub decisions: Vec<Decision>,
    pub action_items: Vec<ActionItem>,
    pub open_questions: Vec<OpenQuestion>,
}

impl Artifacts {
    /// Every `(artifact id, based_on)` pair, for provenance checks
    pub fn provenance(&self) -> impl Iterator<Item = (&str, &[String])> {
        let decisions = self
            .decisions
            .iter()
            .map(|d| (d.decision_id.as_str(), d.based_on.as_slice()));
        let actions = self
            .action_items
            .iter()
            .map(|a| (a.action_id.as_str(), a.based_on.as_slice()));
        let questions = self
            .open_questions
            .iter()
            .map(|q| (q.question_id.as_str(), q.based_on.as_slice()));
        decisions.chain(actions).chain(questions)
    }

    pub fn len(&self) -> usize {
        self.decisions.len() + self.action_items.len() + self.open_questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn push(&mut self, artifact: Artifact) {
        match artifact {
            Artifact::Decision(d) => self.decisions.push(d),
            Artifact::ActionItem(a) => self.action_items.push(a),
            Artifact::OpenQuestion(q) => self.open_questions.push(q),
        }
    }
}
