use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Course, CourseChanges, CourseId, Lesson, User},
    protocol::{CoursesEnvelope, LessonsEnvelope, LessonsQuery, LoginRequest},
};
use url::Url;

use crate::{error::ClientError, request::RequestResult};

const LESSONS_PAGE_SIZE: u32 = 10_000;

/// Remote course catalog backend.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /api/courses`, unwrapped from its `payload` envelope.
    async fn load_all_courses(&self) -> RequestResult<Vec<Course>>;
    async fn load_course_by_id(&self, course_id: &CourseId) -> RequestResult<Course>;
    async fn load_course_lessons(&self, course_id: &CourseId) -> RequestResult<Vec<Lesson>>;
    /// `PUT /api/courses/{id}` with only the changed fields. The response body
    /// is opaque.
    async fn save_course(
        &self,
        course_id: &CourseId,
        changes: &CourseChanges,
    ) -> RequestResult<Value>;
    async fn login(&self, email: &str, password: &str) -> RequestResult<User>;
}

#[derive(Clone)]
pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> RequestResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Network(format!("invalid endpoint '{path}': {err}")))
    }
}

async fn ensure_success(response: Response) -> RequestResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::status(status.as_u16(), &body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RequestResult<T> {
    let bytes = ensure_success(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn load_all_courses(&self) -> RequestResult<Vec<Course>> {
        let response = self.http.get(self.endpoint("api/courses")?).send().await?;
        let envelope: CoursesEnvelope = read_json(response).await?;
        Ok(envelope.into_payload())
    }

    async fn load_course_by_id(&self, course_id: &CourseId) -> RequestResult<Course> {
        let response = self
            .http
            .get(self.endpoint(&format!("api/courses/{course_id}"))?)
            .send()
            .await?;
        read_json(response).await
    }

    async fn load_course_lessons(&self, course_id: &CourseId) -> RequestResult<Vec<Lesson>> {
        let response = self
            .http
            .get(self.endpoint("api/lessons")?)
            .query(&LessonsQuery {
                course_id: course_id.to_string(),
                page_size: LESSONS_PAGE_SIZE,
            })
            .send()
            .await?;
        let envelope: LessonsEnvelope = read_json(response).await?;
        Ok(envelope.into_payload())
    }

    async fn save_course(
        &self,
        course_id: &CourseId,
        changes: &CourseChanges,
    ) -> RequestResult<Value> {
        let response = self
            .http
            .put(self.endpoint(&format!("api/courses/{course_id}"))?)
            .json(changes)
            .send()
            .await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn login(&self, email: &str, password: &str) -> RequestResult<User> {
        let response = self
            .http
            .post(self.endpoint("api/login")?)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
