// src/web/handlers/document_handlers.rs
use rocket::http::uri::{fmt::Path, Segments};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use super::validated;
use crate::app_log;
use crate::documents::{DocumentFormat, DocumentGenerator, GeneratedFile};
use crate::types::CvPayload;
use crate::utils::validate_download_filename;
use crate::web::types::*;

/// Render an unsaved payload into the output directory under a fresh id
pub async fn generate_document_handler(
    request: Json<StandardRequest<CvPayload>>,
    format: DocumentFormat,
    generator: &State<DocumentGenerator>,
) -> Result<Json<DataResponse<GeneratedFile>>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;
    let id = Uuid::new_v4().to_string();

    app_log!(
        info,
        "Generating {} for {} (theme: {})",
        format.extension(),
        data.personal_info.name,
        data.theme.as_str()
    );

    let file = generator.generate(&id, &data, format).await.map_err(|e| {
        app_log!(error, "Document generation failed: {}", e);
        ApiError::internal(
            "Failed to generate document",
            "GENERATION_FAILED",
            conversation_id.clone(),
        )
    })?;

    Ok(Json(DataResponse::success(
        format!("Generated {}", file.filename),
        file,
        conversation_id,
    )))
}

pub async fn generate_html_handler(
    request: Json<StandardRequest<CvPayload>>,
    generator: &State<DocumentGenerator>,
) -> Result<RawHtml<String>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;

    let html = generator.render_html(&data).await.map_err(|e| {
        app_log!(error, "HTML rendering failed: {}", e);
        ApiError::internal("Failed to render print view", "RENDER_FAILED", conversation_id)
    })?;

    Ok(RawHtml(html))
}

/// Serve a generated file. The name is checked before any path is built.
pub async fn download_handler(
    segments: Segments<'_, Path>,
    format: DocumentFormat,
    generator: &State<DocumentGenerator>,
) -> Result<DocumentResponse, ApiError> {
    let filename = segments.collect::<Vec<_>>().join("/");

    if let Err(e) = validate_download_filename(&filename, format.extension()) {
        app_log!(warn, "Rejected download name {:?}: {}", filename, e);
        return Err(ApiError::bad_request(
            e.to_string(),
            "INVALID_FILENAME",
            vec![format!(
                "Use the filename returned by the generate endpoint (cv_<id>.{})",
                format.extension()
            )],
            None,
        ));
    }

    match generator.read_output(&filename).await {
        Ok(Some(bytes)) => {
            app_log!(info, "Serving {} ({} bytes)", filename, bytes.len());
            Ok(DocumentResponse::new(bytes, format, filename))
        }
        Ok(None) => Err(ApiError::new(
            rocket::http::Status::NotFound,
            format!("File not found: {}", filename),
            "FILE_NOT_FOUND",
            vec!["Generate the document again".to_string()],
            None,
        )),
        Err(e) => {
            app_log!(error, "Failed to read {}: {}", filename, e);
            Err(ApiError::internal("Failed to read file", "DOWNLOAD_FAILED", None))
        }
    }
}
