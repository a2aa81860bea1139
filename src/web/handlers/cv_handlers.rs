// src/web/handlers/cv_handlers.rs
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;
use tracing::Instrument;

use super::validated;
use crate::documents::{DocumentFormat, DocumentGenerator, GeneratedFile};
use crate::graph::{RootKind, SharedStore};
use crate::types::{CvPayload, Record, RecordSummary};
use crate::web::types::*;
use crate::{app_log, app_span};

pub async fn save_cv_handler(
    request: Json<StandardRequest<CvPayload>>,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<SavedRecord>>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;

    let record = store
        .create(RootKind::Cv, &data)
        .instrument(app_span!("save_cv", name = %data.personal_info.name))
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "SAVE_FAILED", conversation_id.clone()))?;

    app_log!(info, "Saved CV {} ({})", record.id, record.updated_at);

    Ok(Json(DataResponse::success(
        "CV saved".to_string(),
        SavedRecord {
            id: record.id,
            updated_at: record.updated_at,
        },
        conversation_id,
    )))
}

pub async fn get_cv_handler(
    id: &str,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    let record = store
        .get(RootKind::Cv, id)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "READ_FAILED", None))?;

    app_log!(debug, "Loaded CV {}", id);
    Ok(Json(DataResponse::success("CV loaded".to_string(), record, None)))
}

pub async fn list_cvs_handler(
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Vec<RecordSummary>>>, ApiError> {
    let summaries = store
        .list(RootKind::Cv)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "READ_FAILED", None))?;

    Ok(Json(DataResponse::success(
        format!("{} CV(s)", summaries.len()),
        summaries,
        None,
    )))
}

pub async fn update_cv_handler(
    id: &str,
    request: Json<StandardRequest<CvPayload>>,
    if_match: IfMatch,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;

    let record = store
        .replace(RootKind::Cv, id, &data, if_match.version())
        .instrument(app_span!("update_cv", id = %id, if_match = ?if_match.version()))
        .await
        .map_err(|e| {
            ApiError::from_store(e, RootKind::Cv, "UPDATE_FAILED", conversation_id.clone())
        })?;

    app_log!(info, "Replaced CV {} now at {}", record.id, record.updated_at);
    Ok(Json(DataResponse::success(
        "CV updated".to_string(),
        record,
        conversation_id,
    )))
}

pub async fn delete_cv_handler(
    id: &str,
    store: &State<SharedStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    let removed = store
        .delete(RootKind::Cv, id)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "DELETE_FAILED", None))?;

    if !removed {
        app_log!(info, "Delete of unknown CV {}", id);
        return Err(ApiError::not_found(RootKind::Cv, None));
    }

    app_log!(info, "Deleted CV {}", id);
    Ok(Json(ActionResponse::success(
        format!("CV {} deleted", id),
        "cv_deleted".to_string(),
        None,
    )
    .with_next_actions(vec!["GET /api/cvs".to_string()])))
}

pub async fn print_cv_handler(
    id: &str,
    store: &State<SharedStore>,
    generator: &State<DocumentGenerator>,
) -> Result<RawHtml<String>, ApiError> {
    let record = store
        .get(RootKind::Cv, id)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "READ_FAILED", None))?;

    let html = generator.render_html(&record.data).await.map_err(|e| {
        app_log!(error, "Print rendering failed for CV {}: {}", id, e);
        ApiError::internal("Failed to render print view", "RENDER_FAILED", None)
    })?;

    Ok(RawHtml(html))
}

pub async fn generate_saved_cv_handler(
    id: &str,
    format: Option<&str>,
    store: &State<SharedStore>,
    generator: &State<DocumentGenerator>,
) -> Result<Json<DataResponse<GeneratedFile>>, ApiError> {
    let format = match format.map(DocumentFormat::parse) {
        None => DocumentFormat::Odt,
        Some(Some(format)) if format != DocumentFormat::Html => format,
        Some(_) => {
            return Err(ApiError::bad_request(
                format!("Unsupported format: {}", format.unwrap_or_default()),
                "INVALID_FORMAT",
                vec!["Use format=odt or format=docx".to_string()],
                None,
            ))
        }
    };

    let record = store
        .get(RootKind::Cv, id)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Cv, "READ_FAILED", None))?;

    let file = generator
        .generate(&record.id, &record.data, format)
        .await
        .map_err(|e| {
            app_log!(error, "Generation failed for CV {}: {}", id, e);
            ApiError::internal("Failed to generate document", "GENERATION_FAILED", None)
        })?;

    Ok(Json(DataResponse::success(
        format!("Generated {}", file.filename),
        file,
        None,
    )))
}
