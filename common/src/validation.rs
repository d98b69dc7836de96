// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use serde::{Deserialize, Serialize};

use crate::schema::{
    parse_date, BoardPatch, InsertBoard, InsertTask, InsertTimeEntry, InsertUser, TaskPatch,
};

const NAME_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 1000;
const AVATAR_MAX: usize = 500;
const STATUS_MAX: usize = 50;

/// One rejected field of a request body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Field-by-field validation of a request payload.
pub trait Validate {
    /// Returns every failing field, not just the first one.
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required_text(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.fail(field, "must not be empty");
        } else {
            self.max_len(field, value, max);
        }
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.fail(field, format!("must be at most {max} characters"));
        }
    }

    fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.max_len(field, value, max);
        }
    }

    fn hex_color(&mut self, field: &str, value: &str) {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            self.fail(field, "must be a hex color like #0073EA");
        }
    }

    fn date(&mut self, field: &str, value: Option<&str>) {
        // Empty strings are treated as "no date" when stored.
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if parse_date(value).is_none() {
                self.fail(field, "must be a date formatted YYYY-MM-DD");
            }
        }
    }

    fn non_negative(&mut self, field: &str, value: Option<i32>) {
        if value.is_some_and(|v| v < 0) {
            self.fail(field, "must not be negative");
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !value.contains('@') {
            self.fail(field, "must be an email address");
        } else {
            self.max_len(field, value, NAME_MAX);
        }
    }

    fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl Validate for InsertUser {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        check.required_text("username", &self.username, NAME_MAX);
        check.required_text("password", &self.password, NAME_MAX);
        check.required_text("name", &self.name, NAME_MAX);
        check.email("email", &self.email);
        check.optional_text("avatar", self.avatar.as_deref(), AVATAR_MAX);
        check.finish()
    }
}

impl Validate for InsertBoard {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        check.required_text("name", &self.name, NAME_MAX);
        check.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        check.hex_color("color", &self.color);
        check.required_text("status", &self.status, STATUS_MAX);
        check.finish()
    }
}

impl Validate for BoardPatch {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        if let Some(name) = &self.name {
            check.required_text("name", name, NAME_MAX);
        }
        check.optional_text(
            "description",
            self.description.as_ref().and_then(|d| d.as_deref()),
            DESCRIPTION_MAX,
        );
        if let Some(color) = &self.color {
            check.hex_color("color", color);
        }
        if let Some(status) = &self.status {
            check.required_text("status", status, STATUS_MAX);
        }
        check.finish()
    }
}

impl Validate for InsertTask {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        check.required_text("name", &self.name, NAME_MAX);
        check.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        check.date("dueDate", self.due_date.as_deref());
        check.date("startDate", self.start_date.as_deref());
        check.non_negative("estimatedHours", self.estimated_hours);
        check.non_negative("actualHours", self.actual_hours);
        check.non_negative("position", self.position);
        check.finish()
    }
}

impl Validate for TaskPatch {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        if let Some(name) = &self.name {
            check.required_text("name", name, NAME_MAX);
        }
        check.optional_text(
            "description",
            self.description.as_ref().and_then(|d| d.as_deref()),
            DESCRIPTION_MAX,
        );
        check.date("dueDate", self.due_date.as_ref().and_then(|d| d.as_deref()));
        check.date("startDate", self.start_date.as_ref().and_then(|d| d.as_deref()));
        check.non_negative("estimatedHours", self.estimated_hours.flatten());
        check.non_negative("actualHours", self.actual_hours);
        check.non_negative("position", self.position);
        check.finish()
    }
}

impl Validate for InsertTimeEntry {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut check = Checker::default();
        check.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        check.non_negative("minutes", Some(self.minutes));
        if parse_date(&self.date).is_none() {
            check.fail("date", "must be a date formatted YYYY-MM-DD");
        }
        check.finish()
    }
}
