//! Form payloads and field validation.
//!
//! All fields deserialize as strings so that a bad value (empty priority,
//! unknown status) lands here as a field error instead of a framework-level
//! rejection, and the submitted values can be re-rendered into the form.

use crate::db::tasks::TaskInput;
use crate::types::TaskStatus;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Minimum accepted title length, in characters.
pub const MIN_TITLE_LEN: usize = 5;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 150;

/// Field name → message map collected during validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Task create/edit form payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    /// Checkbox: present ("on") when checked, absent otherwise.
    #[serde(default)]
    pub completed: Option<String>,
}

impl TaskForm {
    /// Validate and normalize into a [`TaskInput`].
    ///
    /// Titles shorter than [`MIN_TITLE_LEN`] are rejected; accepted titles
    /// are stored upper-cased. An omitted priority defaults to 1, an omitted
    /// status to PENDING.
    pub fn validate(&self) -> Result<TaskInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.chars().count() < MIN_TITLE_LEN {
            errors.push(
                "title",
                format!("Title must be at least {} characters", MIN_TITLE_LEN),
            );
        }

        let priority = match self.priority.trim() {
            "" => 1,
            raw => match raw.parse::<i64>() {
                Ok(p) if p >= 1 => p,
                Ok(_) | Err(_) => {
                    errors.push("priority", "Priority must be a positive whole number");
                    0
                }
            },
        };

        let status = match self.status.trim() {
            "" => TaskStatus::default(),
            raw => match raw.parse::<TaskStatus>() {
                Ok(status) => status,
                Err(_) => {
                    errors.push("status", "Unknown status");
                    TaskStatus::default()
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TaskInput {
            title: title.to_uppercase(),
            description: self.description.trim().to_string(),
            completed: self.completed.is_some(),
            priority,
            status,
        })
    }
}

/// Registration form payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Validated registration values: lower-cased username plus the password.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidSignup, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        let len = username.chars().count();
        if len < MIN_USERNAME_LEN || len > MAX_USERNAME_LEN {
            errors.push(
                "username",
                format!(
                    "Username must be between {} and {} characters",
                    MIN_USERNAME_LEN, MAX_USERNAME_LEN
                ),
            );
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            errors.push(
                "username",
                "Username may only contain letters, digits, and _ . -",
            );
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        } else if self.password != self.password_confirm {
            errors.push("password_confirm", "Passwords do not match");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidSignup {
            username: username.to_lowercase(),
            password: self.password.clone(),
        })
    }
}

/// Login form payload. Presence checks only; credential verification happens
/// against the stored digest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok((username.to_lowercase(), self.password.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_form(title: &str) -> TaskForm {
        TaskForm {
            title: title.to_string(),
            ..TaskForm::default()
        }
    }

    #[test]
    fn short_title_is_rejected() {
        let errors = task_form("wash").validate().unwrap_err();
        assert!(errors.get("title").is_some());
    }

    #[test]
    fn four_chars_padded_with_spaces_still_rejected() {
        let errors = task_form("  ab c  ").validate().unwrap_err();
        assert!(errors.get("title").is_some());
    }

    #[test]
    fn accepted_title_is_uppercased() {
        let input = task_form("buy groceries").validate().unwrap();
        assert_eq!(input.title, "BUY GROCERIES");
    }

    #[test]
    fn defaults_fill_priority_and_status() {
        let input = task_form("water the plants").validate().unwrap();
        assert_eq!(input.priority, 1);
        assert_eq!(input.status, TaskStatus::Pending);
        assert!(!input.completed);
    }

    #[test]
    fn zero_and_negative_priority_rejected() {
        for bad in ["0", "-3", "2.5", "abc"] {
            let form = TaskForm {
                title: "valid title".to_string(),
                priority: bad.to_string(),
                ..TaskForm::default()
            };
            let errors = form.validate().unwrap_err();
            assert!(errors.get("priority").is_some(), "{bad} should be rejected");
        }
    }

    #[test]
    fn checkbox_presence_maps_to_completed() {
        let form = TaskForm {
            title: "valid title".to_string(),
            completed: Some("on".to_string()),
            ..TaskForm::default()
        };
        assert!(form.validate().unwrap().completed);
    }

    #[test]
    fn unknown_status_is_a_field_error() {
        let form = TaskForm {
            title: "valid title".to_string(),
            status: "DONE".to_string(),
            ..TaskForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("status").is_some());
    }

    #[test]
    fn signup_rejects_mismatched_passwords() {
        let form = SignupForm {
            username: "alice".to_string(),
            password: "longenough".to_string(),
            password_confirm: "different1".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("password_confirm").is_some());
    }

    #[test]
    fn signup_normalizes_username_case() {
        let form = SignupForm {
            username: "Alice.B".to_string(),
            password: "longenough".to_string(),
            password_confirm: "longenough".to_string(),
        };
        assert_eq!(form.validate().unwrap().username, "alice.b");
    }

    #[test]
    fn signup_rejects_exotic_characters() {
        let form = SignupForm {
            username: "al ice!".to_string(),
            password: "longenough".to_string(),
            password_confirm: "longenough".to_string(),
        };
        assert!(form.validate().unwrap_err().get("username").is_some());
    }
}
