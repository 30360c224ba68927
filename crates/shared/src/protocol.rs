use serde::{Deserialize, Serialize};

use crate::domain::{Course, Lesson};

/// List endpoints wrap their rows in `{ "payload": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn into_payload(self) -> T {
        self.payload
    }
}

pub type CoursesEnvelope = Envelope<Vec<Course>>;
pub type LessonsEnvelope = Envelope<Vec<Lesson>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonsQuery {
    pub course_id: String,
    pub page_size: u32,
}
