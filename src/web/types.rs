// src/web/types.rs
use rocket::http::{ContentType, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};
use std::convert::Infallible;
use std::path::PathBuf;

use crate::documents::DocumentFormat;
use crate::validation::FieldError;

pub struct ServerConfig {
    pub output_dir: PathBuf,
    pub templates_dir: PathBuf,
}

/// A rendered document sent as an attachment
pub struct DocumentResponse {
    pub data: Vec<u8>,
    pub format: DocumentFormat,
    pub filename: String,
}

impl DocumentResponse {
    pub fn new(data: Vec<u8>, format: DocumentFormat, filename: String) -> Self {
        Self {
            data,
            format,
            filename,
        }
    }
}

impl<'r> Responder<'r, 'static> for DocumentResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let content_type =
            ContentType::parse_flexible(self.format.content_type()).unwrap_or(ContentType::Binary);

        Response::build()
            .header(content_type)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

/// `If-Match` precondition carrying the `updated_at` of an earlier read.
/// Quotes around the value are ignored.
pub struct IfMatch(pub Option<String>);

impl IfMatch {
    pub fn version(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for IfMatch {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let version = request
            .headers()
            .get_one("If-Match")
            .map(|value| value.trim().trim_matches('"').to_string())
            .filter(|value| !value.is_empty() && value != "*");
        Outcome::Success(IfMatch(version))
    }
}

// ===== Request envelopes =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

// ===== Response data =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SavedRecord {
    pub id: String,
    pub updated_at: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ThemeInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub primary_color: String,
    pub font_family: &'static str,
    /// A print template override exists for this theme
    pub custom_print_template: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthData {
    pub status: &'static str,
    pub store: &'static str,
    pub store_reachable: bool,
    pub ai_enabled: bool,
}

// ===== Standard response envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            next_actions: None,
            conversation_id,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            field_errors: None,
            conversation_id,
        }
    }
}

/// Error envelope plus the HTTP status it is sent with
pub struct ApiError {
    pub status: Status,
    pub body: StandardErrorResponse,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        (self.status, rocket::serde::json::Json(self.body)).respond_to(request)
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status.code, self.body.error_code, self.body.error)
    }
}
