//! Student directory client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use notify_core::config::DirectoryConfig;
use notify_core::error::AppError;

use super::resolver::ResolveError;

/// A student as returned by the directory service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
    #[serde(default)]
    pub parent_email: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub section: Option<String>,
    /// Missing means active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl StudentRecord {
    /// Whether the student is currently enrolled.
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    /// Best available display name.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Read access to the student directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync + 'static {
    async fn all_students(&self) -> Result<Vec<StudentRecord>, ResolveError>;

    async fn students_by_class(&self, class_id: i64) -> Result<Vec<StudentRecord>, ResolveError>;

    async fn students_by_class_section(
        &self,
        class_id: i64,
        section: &str,
    ) -> Result<Vec<StudentRecord>, ResolveError>;

    async fn students_by_ids(&self, ids: &[i64]) -> Result<Vec<StudentRecord>, ResolveError>;
}

/// The directory answers either with a bare list or an `ApiResponse`-style wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum StudentList {
    Plain(Vec<StudentRecord>),
    Wrapped { data: Vec<StudentRecord> },
}

impl From<StudentList> for Vec<StudentRecord> {
    fn from(list: StudentList) -> Self {
        match list {
            StudentList::Plain(v) | StudentList::Wrapped { data: v } => v,
        }
    }
}

/// [`DirectoryClient`] over the directory's JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    /// Create a client for the configured directory.
    pub fn new(config: &DirectoryConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Directory HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ResolveError> {
        let response = request
            .send()
            .await
            .map_err(|e| ResolveError::DirectoryUnavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::DirectoryUnavailable(format!(
                "directory returned {status}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ResolveError::DirectoryUnavailable(format!("malformed response: {e}")))
    }

    async fn get_list(&self, path: &str) -> Result<Vec<StudentRecord>, ResolveError> {
        debug!(path = %path, "Querying student directory");
        let list: StudentList = self.read(self.client.get(self.url(path))).await?;
        Ok(list.into())
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn all_students(&self) -> Result<Vec<StudentRecord>, ResolveError> {
        self.get_list("/api/students").await
    }

    async fn students_by_class(&self, class_id: i64) -> Result<Vec<StudentRecord>, ResolveError> {
        self.get_list(&format!("/api/students/class/{class_id}")).await
    }

    async fn students_by_class_section(
        &self,
        class_id: i64,
        section: &str,
    ) -> Result<Vec<StudentRecord>, ResolveError> {
        self.get_list(&format!("/api/students/class/{class_id}/section/{section}"))
            .await
    }

    async fn students_by_ids(&self, ids: &[i64]) -> Result<Vec<StudentRecord>, ResolveError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list: StudentList = self
            .read(self.client.post(self.url("/api/students/bulk")).json(ids))
            .await?;
        Ok(list.into())
    }
}
