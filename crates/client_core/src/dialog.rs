use std::fmt;

use chrono::{DateTime, Utc};
use shared::{
    domain::{Category, Course, CourseChanges},
    error::ParseCategoryError,
};
use thiserror::Error;

use crate::{
    catalog::{CoursesStore, SaveHandle},
    error::CatalogError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Description,
    Category,
    ReleasedAt,
    LongDescription,
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CourseField::Description => "description",
            CourseField::Category => "category",
            CourseField::ReleasedAt => "release date",
            CourseField::LongDescription => "long description",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldViolation {
    #[error("{0} is required")]
    Required(CourseField),
    #[error(transparent)]
    UnknownCategory(ParseCategoryError),
}

impl FieldViolation {
    pub fn field(&self) -> CourseField {
        match self {
            FieldViolation::Required(field) => *field,
            FieldViolation::UnknownCategory(_) => CourseField::Category,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    /// The session comes back unchanged so the form can be corrected.
    #[error("{} field(s) need attention", violations.len())]
    Invalid {
        violations: Vec<FieldViolation>,
        session: Box<CourseEditSession>,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// How an edit session ended.
#[derive(Debug)]
pub enum DialogOutcome {
    /// The changes are already applied locally; `save` tracks the backend.
    Saved {
        changes: CourseChanges,
        save: SaveHandle,
    },
    Closed,
}

impl DialogOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DialogOutcome::Saved { .. })
    }
}

/// Working copy of one course's editable fields.
#[derive(Debug, Clone)]
pub struct CourseEditSession {
    course: Course,
    pub description: String,
    pub category: String,
    /// Starts at the moment the session opens, not at the course's recorded
    /// release date.
    pub released_at: Option<DateTime<Utc>>,
    pub long_description: String,
}

impl CourseEditSession {
    pub fn open(course: Course) -> Self {
        Self {
            description: course.description.clone(),
            category: course.category.to_string(),
            released_at: Some(Utc::now()),
            long_description: course.long_description.clone(),
            course,
        }
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.description.trim().is_empty() {
            violations.push(FieldViolation::Required(CourseField::Description));
        }
        if self.category.trim().is_empty() {
            violations.push(FieldViolation::Required(CourseField::Category));
        } else if let Err(err) = self.category.parse::<Category>() {
            violations.push(FieldViolation::UnknownCategory(err));
        }
        if self.released_at.is_none() {
            violations.push(FieldViolation::Required(CourseField::ReleasedAt));
        }
        if self.long_description.trim().is_empty() {
            violations.push(FieldViolation::Required(CourseField::LongDescription));
        }
        violations
    }

    pub fn changes(&self) -> Result<CourseChanges, Vec<FieldViolation>> {
        let violations = self.validate();
        if !violations.is_empty() {
            return Err(violations);
        }
        Ok(CourseChanges {
            description: Some(self.description.clone()),
            category: self.category.parse().ok(),
            released_at: self.released_at,
            long_description: Some(self.long_description.clone()),
            ..CourseChanges::default()
        })
    }

    /// Hands the changes to the store and closes without waiting for the
    /// backend. An invalid form is returned inside the error with the store
    /// untouched.
    pub fn confirm(self, store: &CoursesStore) -> Result<DialogOutcome, EditError> {
        let changes = match self.changes() {
            Ok(changes) => changes,
            Err(violations) => {
                return Err(EditError::Invalid {
                    violations,
                    session: Box::new(self),
                });
            }
        };
        let save = store.save_course(&self.course.id, changes.clone())?;
        Ok(DialogOutcome::Saved { changes, save })
    }

    pub fn cancel(self) -> DialogOutcome {
        DialogOutcome::Closed
    }
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;
