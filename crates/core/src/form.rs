//! Form (survey) definitions and submission validation.
//!
//! A form block is only completed through a full submission: every required
//! question answered, every answer matching its question's kind.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block_content::ValidateContent;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Number,
    SingleChoice,
    MultipleChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub questions: Vec<Question>,
}

/// Answers keyed by question id.
pub type Answers = Map<String, Value>;

impl ValidateContent for FormDefinition {
    fn validate(&self) -> Result<(), CoreError> {
        if self.questions.is_empty() {
            return Err(CoreError::Validation(
                "A form needs at least one question".into(),
            ));
        }
        let mut seen = HashSet::new();
        for question in &self.questions {
            if question.id.trim().is_empty() {
                return Err(CoreError::Validation("Question ids must not be empty".into()));
            }
            if !seen.insert(question.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate question id '{}'",
                    question.id
                )));
            }
            let is_choice = matches!(
                question.kind,
                QuestionKind::SingleChoice | QuestionKind::MultipleChoice
            );
            if is_choice && question.options.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Choice question '{}' needs at least one option",
                    question.id
                )));
            }
        }
        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_answer(question: &Question, value: &Value) -> Result<(), CoreError> {
    let invalid = |expected: &str| {
        CoreError::Validation(format!(
            "Answer to '{}' must be {expected}",
            question.id
        ))
    };
    let allowed = |choice: &str| question.options.iter().any(|o| o == choice);

    match question.kind {
        QuestionKind::Text => value.as_str().map(|_| ()).ok_or_else(|| invalid("a string")),
        QuestionKind::Number => value.as_f64().map(|_| ()).ok_or_else(|| invalid("a number")),
        QuestionKind::SingleChoice => match value.as_str() {
            Some(choice) if allowed(choice) => Ok(()),
            _ => Err(invalid("one of the listed options")),
        },
        QuestionKind::MultipleChoice => {
            let items = value.as_array().ok_or_else(|| invalid("a list of options"))?;
            if items
                .iter()
                .all(|item| item.as_str().is_some_and(|choice| allowed(choice)))
            {
                Ok(())
            } else {
                Err(invalid("a list of the listed options"))
            }
        }
    }
}

/// Validate a full submission against its form definition.
pub fn validate_submission(form: &FormDefinition, answers: &Answers) -> Result<(), CoreError> {
    for key in answers.keys() {
        if !form.questions.iter().any(|q| &q.id == key) {
            return Err(CoreError::Validation(format!("Unknown question '{key}'")));
        }
    }

    let mut unanswered = Vec::new();
    for question in &form.questions {
        match answers.get(&question.id) {
            Some(value) if !is_blank(value) => check_answer(question, value)?,
            _ if question.required => unanswered.push(question.id.as_str()),
            _ => {}
        }
    }

    if !unanswered.is_empty() {
        return Err(CoreError::Validation(format!(
            "Required questions not answered: {}",
            unanswered.join(", ")
        )));
    }
    Ok(())
}
