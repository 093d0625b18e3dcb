//! Clarification input provider.
//!
//! Asks the operator a list of free-form questions and collects one text
//! answer per question.
//!
//! Request payload: `{"questions": ["..."]}`.
//! Response payload: `{"responses": {"question_1": {"question": "...",
//! "response": "..."}, ...}}` keyed in question order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::InputProvider;

/// Provider for clarification questions.
pub struct ClarificationProvider;

/// Stable type id for clarification exchanges.
pub const CLARIFICATION_TYPE_ID: &str = "clarification";

impl InputProvider for ClarificationProvider {
    fn type_id(&self) -> &'static str {
        CLARIFICATION_TYPE_ID
    }

    fn validate_request(&self, data: &Value) -> Result<(), String> {
        let Some(questions) = data.get("questions") else {
            return Err("questions list is required".to_string());
        };
        let Some(list) = questions.as_array() else {
            return Err("questions must be a list".to_string());
        };
        if list.is_empty() {
            return Err("questions list cannot be empty".to_string());
        }
        if list.iter().any(|entry| !entry.is_string()) {
            return Err("questions must be strings".to_string());
        }
        Ok(())
    }

    fn validate_response(&self, data: &Value) -> Result<(), String> {
        let Some(object) = data.as_object() else {
            return Err("response data must be an object".to_string());
        };
        if !object.contains_key("responses") {
            return Err("response must contain a `responses` key".to_string());
        }
        Ok(())
    }
}

/// One answered clarification question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClarificationAnswer {
    pub question: String,
    pub response: String,
}

/// Build a clarification request payload from a question list.
pub fn questions_payload<S: AsRef<str>>(questions: &[S]) -> Value {
    json!({
        "questions": questions.iter().map(|q| q.as_ref()).collect::<Vec<_>>()
    })
}

/// Build a clarification response payload from answers in question order.
///
/// Answers are keyed `question_1`, `question_2`, ... matching how the
/// presentation side labels prompts.
pub fn answers_payload(answers: &[ClarificationAnswer]) -> Value {
    let mut responses = serde_json::Map::new();
    for (index, answer) in answers.iter().enumerate() {
        responses.insert(
            format!("question_{}", index + 1),
            json!({"question": answer.question, "response": answer.response}),
        );
    }
    json!({"responses": responses})
}

/// Extract answers from a clarification response payload.
///
/// Returns `None` when the payload does not carry a well-formed `responses`
/// object; entries that are not answer objects are skipped.
pub fn parse_answers(data: &Value) -> Option<BTreeMap<String, ClarificationAnswer>> {
    let responses = data.get("responses")?.as_object()?;
    let mut parsed = BTreeMap::new();
    for (key, entry) in responses {
        if let Ok(answer) = serde_json::from_value::<ClarificationAnswer>(entry.clone()) {
            parsed.insert(key.clone(), answer);
        }
    }
    Some(parsed)
}
