//! Scenario value object - the problem or decision under evaluation.
//!
//! A scenario is supplied once at run creation and is read-only for every
//! component downstream of the orchestrator.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Supporting inputs for a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInputs {
    pub documents: Vec<String>,
    pub links: Vec<String>,
    pub notes: String,
}

/// The problem or decision to evaluate (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub title: String,
    pub problem_statement: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub inputs: ScenarioInputs,
}

impl Scenario {
    pub fn new(title: impl Into<String>, problem_statement: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            problem_statement: problem_statement.into(),
            context: String::new(),
            objectives: Vec::new(),
            constraints: Vec::new(),
            assumptions: Vec::new(),
            success_criteria: Vec::new(),
            inputs: ScenarioInputs::default(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objectives.push(objective.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_assumption(mut self, assumption: impl Into<String>) -> Self {
        self.assumptions.push(assumption.into());
        self
    }

    pub fn with_success_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.success_criteria.push(criterion.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidScenario("title is empty".to_string()));
        }
        if self.problem_statement.trim().is_empty() {
            return Err(DomainError::InvalidScenario(
                "problem statement is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the scenario as a markdown brief, sections omitted when empty
    pub fn to_markdown(&self) -> String {
        let mut parts = vec![
            format!("# Scenario: {}", self.title),
            String::new(),
            "## Problem Statement".to_string(),
            self.problem_statement.clone(),
        ];

        if !self.context.is_empty() {
            parts.extend([String::new(), "## Context".to_string(), self.context.clone()]);
        }

        let lists = [
            ("Objectives", &self.objectives),
            ("Constraints", &self.constraints),
            ("Stated Assumptions", &self.assumptions),
            ("Success Criteria", &self.success_criteria),
        ];
        for (heading, items) in lists {
            if items.is_empty() {
                continue;
            }
            parts.push(String::new());
            parts.push(format!("## {heading}"));
            parts.extend(items.iter().map(|item| format!("- {item}")));
        }

        parts.join("\n")
    }
}
