// src/web/mod.rs
//! Rocket routes under `/api`, CORS and JSON error catchers

pub mod error;
pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::uri::{fmt::Path, Segments};
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catch, catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};

use crate::ai::{DraftRequest, DraftResult, DraftService, RewriteRequest, RewriteResult};
use crate::app_log;
use crate::documents::{DocumentFormat, DocumentGenerator, GeneratedFile};
use crate::graph::SharedStore;
use crate::types::{CvPayload, Record, RecordSummary};

/// Echoes the request origin when it is on the allow-list; `*` allows any origin
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        origin
            .filter(|origin| self.allowed_origins.iter().any(|o| o == origin))
            .map(str::to_string)
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS allow-list",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(origin) = self.allow_origin(request.headers().get_one("Origin")) else {
            return;
        };

        if origin != "*" {
            response.set_header(Header::new("Vary", "Origin"));
        }
        response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, If-Match, Authorization",
        ));
        response.set_header(Header::new(
            "Access-Control-Expose-Headers",
            "Content-Disposition",
        ));
    }
}

// ===== CV records =====

#[post("/save-cv", data = "<request>")]
pub async fn save_cv(
    request: Json<StandardRequest<CvPayload>>,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<SavedRecord>>, ApiError> {
    handlers::save_cv_handler(request, store).await
}

#[get("/cv/<id>")]
pub async fn get_cv(
    id: &str,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    handlers::get_cv_handler(id, store).await
}

#[get("/cvs")]
pub async fn list_cvs(
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Vec<RecordSummary>>>, ApiError> {
    handlers::list_cvs_handler(store).await
}

#[put("/cv/<id>", data = "<request>")]
pub async fn update_cv(
    id: &str,
    request: Json<StandardRequest<CvPayload>>,
    if_match: IfMatch,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    handlers::update_cv_handler(id, request, if_match, store).await
}

#[delete("/cv/<id>")]
pub async fn delete_cv(id: &str, store: &State<SharedStore>) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_cv_handler(id, store).await
}

#[get("/cv/<id>/print")]
pub async fn print_cv(
    id: &str,
    store: &State<SharedStore>,
    generator: &State<DocumentGenerator>,
) -> Result<RawHtml<String>, ApiError> {
    handlers::print_cv_handler(id, store, generator).await
}

#[post("/cv/<id>/generate?<format>")]
pub async fn generate_saved_cv(
    id: &str,
    format: Option<&str>,
    store: &State<SharedStore>,
    generator: &State<DocumentGenerator>,
) -> Result<Json<DataResponse<GeneratedFile>>, ApiError> {
    handlers::generate_saved_cv_handler(id, format, store, generator).await
}

// ===== Profiles =====

#[get("/profile")]
pub async fn get_profile(store: &State<SharedStore>) -> Result<Json<DataResponse<Record>>, ApiError> {
    handlers::get_profile_handler(store).await
}

#[get("/profile/<timestamp>")]
pub async fn get_profile_by_version(
    timestamp: &str,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    handlers::get_profile_by_version_handler(timestamp, store).await
}

#[post("/profile", data = "<request>")]
pub async fn create_profile(
    request: Json<StandardRequest<CvPayload>>,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<SavedRecord>>, ApiError> {
    handlers::create_profile_handler(request, store).await
}

#[put("/profile", data = "<request>")]
pub async fn update_profile(
    request: Json<StandardRequest<CvPayload>>,
    if_match: IfMatch,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    handlers::update_profile_handler(request, if_match, store).await
}

#[delete("/profile")]
pub async fn delete_profile(store: &State<SharedStore>) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_profile_handler(store).await
}

// ===== Documents =====

#[post("/generate-cv", data = "<request>")]
pub async fn generate_cv(
    request: Json<StandardRequest<CvPayload>>,
    generator: &State<DocumentGenerator>,
) -> Result<Json<DataResponse<GeneratedFile>>, ApiError> {
    handlers::generate_document_handler(request, DocumentFormat::Odt, generator).await
}

#[post("/generate-cv-docx", data = "<request>")]
pub async fn generate_cv_docx(
    request: Json<StandardRequest<CvPayload>>,
    generator: &State<DocumentGenerator>,
) -> Result<Json<DataResponse<GeneratedFile>>, ApiError> {
    handlers::generate_document_handler(request, DocumentFormat::Docx, generator).await
}

#[post("/generate-cv-html", data = "<request>")]
pub async fn generate_cv_html(
    request: Json<StandardRequest<CvPayload>>,
    generator: &State<DocumentGenerator>,
) -> Result<RawHtml<String>, ApiError> {
    handlers::generate_html_handler(request, generator).await
}

#[get("/download/<filename..>")]
pub async fn download(
    filename: Segments<'_, Path>,
    generator: &State<DocumentGenerator>,
) -> Result<DocumentResponse, ApiError> {
    handlers::download_handler(filename, DocumentFormat::Odt, generator).await
}

#[get("/download-docx/<filename..>")]
pub async fn download_docx(
    filename: Segments<'_, Path>,
    generator: &State<DocumentGenerator>,
) -> Result<DocumentResponse, ApiError> {
    handlers::download_handler(filename, DocumentFormat::Docx, generator).await
}

// ===== AI =====

#[post("/ai/generate-cv", data = "<request>")]
pub async fn ai_generate_cv(
    request: Json<StandardRequest<DraftRequest>>,
    store: &State<SharedStore>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<DraftResult>>, ApiError> {
    handlers::ai_generate_cv_handler(request, store, drafts).await
}

#[post("/ai/rewrite", data = "<request>")]
pub async fn ai_rewrite(
    request: Json<StandardRequest<RewriteRequest>>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<RewriteResult>>, ApiError> {
    handlers::ai_rewrite_handler(request, drafts).await
}

// ===== System =====

#[get("/themes")]
pub async fn themes(generator: &State<DocumentGenerator>) -> Json<DataResponse<Vec<ThemeInfo>>> {
    handlers::themes_handler(generator).await
}

#[get("/health")]
pub async fn health(
    store: &State<SharedStore>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<HealthData>>, ApiError> {
    handlers::health_handler(store, drafts).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// ===== Error catchers =====

#[catch(400)]
pub fn bad_request() -> ApiError {
    ApiError::bad_request(
        "Invalid request format",
        "BAD_REQUEST",
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    )
}

#[catch(404)]
pub fn not_found(request: &Request) -> ApiError {
    ApiError::new(
        Status::NotFound,
        format!("No route for {} {}", request.method(), request.uri()),
        "NOT_FOUND",
        vec!["Check the endpoint path".to_string()],
        None,
    )
}

#[catch(422)]
pub fn unprocessable() -> ApiError {
    ApiError::new(
        Status::UnprocessableEntity,
        "Request body does not match the expected shape",
        "UNPROCESSABLE_ENTITY",
        vec!["Check field names and value types".to_string()],
        None,
    )
}

#[catch(500)]
pub fn internal_error() -> ApiError {
    ApiError::internal("Internal server error", "INTERNAL_ERROR", None)
}

// ===== Server assembly =====

/// Mount every route on `rocket` with the given state
pub fn mount(
    rocket: Rocket<Build>,
    store: SharedStore,
    server_config: &ServerConfig,
    drafts: DraftService,
    cors_origins: Vec<String>,
) -> Result<Rocket<Build>> {
    let generator = DocumentGenerator::new(
        server_config.output_dir.clone(),
        server_config.templates_dir.clone(),
    )?;

    Ok(rocket
        .attach(Cors::new(cors_origins))
        .manage(store)
        .manage(generator)
        .manage(drafts)
        .register("/api", catchers![bad_request, not_found, unprocessable, internal_error])
        .mount(
            "/api",
            routes![
                save_cv,
                get_cv,
                list_cvs,
                update_cv,
                delete_cv,
                print_cv,
                generate_saved_cv,
                get_profile,
                get_profile_by_version,
                create_profile,
                update_profile,
                delete_profile,
                generate_cv,
                generate_cv_docx,
                generate_cv_html,
                download,
                download_docx,
                ai_generate_cv,
                ai_rewrite,
                themes,
                health,
                options,
            ],
        ))
}

/// Rocket instance configured from the default figment (`ROCKET_*` variables)
pub fn build_rocket(
    store: SharedStore,
    server_config: &ServerConfig,
    drafts: DraftService,
    cors_origins: Vec<String>,
) -> Result<Rocket<Build>> {
    mount(rocket::build(), store, server_config, drafts, cors_origins)
}

pub async fn start_web_server(
    port: u16,
    store: SharedStore,
    server_config: ServerConfig,
    drafts: DraftService,
    cors_origins: Vec<String>,
) -> Result<()> {
    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", "0.0.0.0"));

    app_log!(info, "Starting CV builder API on port {}", port);
    app_log!(info, "Store backend: {}", store.backend_name());
    app_log!(info, "Output directory: {}", server_config.output_dir.display());
    app_log!(info, "Templates directory: {}", server_config.templates_dir.display());
    app_log!(info, "CORS origins: {}", cors_origins.join(", "));

    let rocket = mount(
        rocket::custom(figment),
        store,
        &server_config,
        drafts,
        cors_origins,
    )?;

    rocket
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

    Ok(())
}
