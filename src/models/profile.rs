use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Rights-holder profile attached to notices and delisting requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub profile_id: String,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Free-form fields forwarded to collaborators untouched
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ProfileData {
    pub fn new(profile_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
