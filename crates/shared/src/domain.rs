use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseCategoryError;

macro_rules! id_newtype {
    ($name:ident) => {
        /// Backends hand these out either as JSON numbers or strings; both
        /// decode to the same key.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                Ok(Self(RawId::deserialize(deserializer)?.into_string()))
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Signed(value) => value.to_string(),
            RawId::Unsigned(value) => value.to_string(),
            RawId::Float(value) => value.to_string(),
            RawId::Text(value) => value,
        }
    }
}

id_newtype!(CourseId);
id_newtype!(LessonId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Beginner,
    Advanced,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Beginner, Category::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Beginner => "BEGINNER",
            Category::Advanced => "ADVANCED",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseCategoryError(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub category: Category,
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    pub seq_no: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_list_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons_count: Option<u32>,
}

/// Display order within a category. `sort_by` is stable, so equal sequence
/// numbers keep their snapshot order.
pub fn sort_courses_by_seq_no(a: &Course, b: &Course) -> Ordering {
    a.seq_no.cmp(&b.seq_no)
}

/// A partial course body. Fields left as `None` keep the current value when
/// merged and are omitted from the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl CourseChanges {
    /// Returns `course` with every set field overwritten. The identifier is
    /// never touched.
    pub fn apply_to(&self, course: &Course) -> Course {
        let mut merged = course.clone();
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(long_description) = &self.long_description {
            merged.long_description = long_description.clone();
        }
        if let Some(released_at) = self.released_at {
            merged.released_at = Some(released_at);
        }
        if let Some(seq_no) = self.seq_no {
            merged.seq_no = seq_no;
        }
        if let Some(icon_url) = &self.icon_url {
            merged.icon_url = Some(icon_url.clone());
        }
        merged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub description: String,
    #[serde(default)]
    pub duration: String,
    pub seq_no: i64,
    pub course_id: CourseId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
