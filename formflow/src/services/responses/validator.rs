use crate::errors::FormflowError;
use crate::models::form::Form;
use crate::models::response_batch::ResponseBatch;
use crate::models::udts::Answer;
use crate::services::flows::snapshot::FlowSnapshot;
use charybdis::types::Uuid;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    #[serde(alias = "flowConnectionId")]
    pub connection_id: String,

    #[serde(default)]
    pub answer_text: String,

    #[serde(default)]
    pub answer_value: Option<serde_json::Value>,

    #[serde(default)]
    pub time_spent: Option<i32>,
}

/// Public response batch as posted by a respondent.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub responses: Vec<AnswerInput>,

    #[serde(default)]
    pub total_time_spent: i32,

    /// Connection ids in the order the respondent walked them.
    #[serde(default)]
    pub flow_path: Vec<String>,
}

/// Checks a submission against the form's current snapshot. Each check short-circuits, in order:
/// publication, accepting state, connection ids, non-empty batch, time values.
pub struct ResponseValidator<'a> {
    form: &'a Form,
    snapshot: &'a FlowSnapshot,
    submission: &'a Submission,
}

impl<'a> ResponseValidator<'a> {
    pub fn new(form: &'a Form, snapshot: &'a FlowSnapshot, submission: &'a Submission) -> Self {
        Self {
            form,
            snapshot,
            submission,
        }
    }

    /// Builds the batch to persist once every check passed.
    pub fn validate(&self, response_id: Uuid) -> Result<ResponseBatch, FormflowError> {
        self.validate_published()?;
        self.validate_accepting()?;

        let known = self.snapshot.connection_ids();
        let answer_ids = self.validate_connection_ids(
            self.submission.responses.iter().map(|r| r.connection_id.as_str()),
            &known,
        )?;
        let flow_path = self.validate_connection_ids(self.submission.flow_path.iter().map(String::as_str), &known)?;

        self.validate_not_empty()?;
        self.validate_times()?;

        let mut answers = Vec::with_capacity(self.submission.responses.len());

        for (input, connection_id) in self.submission.responses.iter().zip(answer_ids) {
            let answer_value = match &input.answer_value {
                None | Some(serde_json::Value::Null) => None,
                Some(value) => Some(serde_json::to_string(value)?),
            };

            answers.push(Answer {
                connection_id,
                answer_text: input.answer_text.clone(),
                answer_value,
                time_spent: input.time_spent,
            });
        }

        Ok(ResponseBatch {
            form_id: self.form.id,
            submitted_at: chrono::Utc::now(),
            id: response_id,
            flow_id: self.snapshot.flow_id.unwrap_or_default(),
            flow_version: self.snapshot.version,
            answers,
            total_time_spent: self.submission.total_time_spent,
            flow_path,
        })
    }

    fn validate_published(&self) -> Result<(), FormflowError> {
        if !self.form.is_published() {
            return Err(FormflowError::NotFound(format!("form {} is not published", self.form.id)));
        }

        Ok(())
    }

    fn validate_accepting(&self) -> Result<(), FormflowError> {
        if !self.form.accepting_responses {
            return Err(FormflowError::NotAccepting(format!(
                "form {} is not accepting responses",
                self.form.id
            )));
        }

        Ok(())
    }

    fn validate_connection_ids<'i>(
        &self,
        ids: impl Iterator<Item = &'i str>,
        known: &HashSet<Uuid>,
    ) -> Result<Vec<Uuid>, FormflowError> {
        ids.map(|raw| {
            Uuid::from_str(raw.trim())
                .ok()
                .filter(|id| known.contains(id))
                .ok_or_else(|| {
                    FormflowError::UnknownConnection(format!(
                        "'{}' is not part of the current flow of form {}",
                        raw, self.form.id
                    ))
                })
        })
        .collect()
    }

    fn validate_not_empty(&self) -> Result<(), FormflowError> {
        if self.submission.responses.is_empty() {
            return Err(FormflowError::ValidationError((
                "responses".to_string(),
                "must contain at least one answer".to_string(),
            )));
        }

        Ok(())
    }

    fn validate_times(&self) -> Result<(), FormflowError> {
        if self.submission.total_time_spent < 0 {
            return Err(FormflowError::ValidationError((
                "totalTimeSpent".to_string(),
                "must not be negative".to_string(),
            )));
        }

        if self.submission.responses.iter().any(|r| r.time_spent.is_some_and(|t| t < 0)) {
            return Err(FormflowError::ValidationError((
                "timeSpent".to_string(),
                "must not be negative".to_string(),
            )));
        }

        Ok(())
    }
}
