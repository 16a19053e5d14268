use crate::error::{IntakeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const EMAIL_ADDRESS: &str = "Email Address";
pub const FORM_USER: &str = "formUser";
pub const EMAIL: &str = "Email";
pub const NAME: &str = "Name";
pub const ASSET_TAG: &str = "Asset Tag";
pub const COMPUTER_STATUS: &str = "Computer Status";
pub const PROBLEM: &str = "What is the problem with your chromebook?";
pub const PROBLEM_DESCRIPTION: &str = "Problem Description";
pub const DAMAGE_INFO: &str = "Damage Info";
pub const INCIDENT_DESCRIPTION: &str = "Incident Description";
pub const APPOINTMENT_NOTES: &str = "Appointment Notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub title: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// One completed form response, as delivered by the submit hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub respondent_email: Option<String>,
    #[serde(default)]
    pub edit_url: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl FormSubmission {
    pub fn from_json(json: &str) -> Result<Self> {
        let submission: FormSubmission = serde_json::from_str(json)?;
        if submission.id.trim().is_empty() {
            return Err(IntakeError::InvalidSubmission(
                "submission has no id".to_string(),
            ));
        }
        Ok(submission)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Answers keyed by question title. Titles can repeat across pages, so
    /// every title maps to all of its values in order. The respondent's
    /// email is recorded under both `Email Address` and `formUser`.
    pub fn response_map(&self) -> ResponseMap {
        let mut map = ResponseMap::default();
        if let Some(email) = self.respondent_email.as_deref().filter(|e| !e.trim().is_empty()) {
            map.push(EMAIL_ADDRESS, email);
            map.push(FORM_USER, email);
        }
        for answer in &self.answers {
            for value in &answer.values {
                map.push(&answer.title, value);
            }
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMap {
    values: BTreeMap<String, Vec<String>>,
}

impl ResponseMap {
    pub fn push(&mut self, title: &str, value: &str) {
        self.values
            .entry(title.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn get(&self, title: &str) -> Option<&[String]> {
        self.values.get(title).map(Vec::as_slice)
    }

    /// First non-blank value for a title.
    pub fn first(&self, title: &str) -> Option<&str> {
        self.get(title)?
            .iter()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    /// All non-blank values for a title joined with `sep`.
    pub fn joined(&self, title: &str, sep: &str) -> Option<String> {
        let values: Vec<&str> = self
            .get(title)?
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();
        (!values.is_empty()).then(|| values.join(sep))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
