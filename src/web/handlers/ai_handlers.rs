// src/web/handlers/ai_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::ai::{DraftRequest, DraftResult, DraftService, RewriteRequest, RewriteResult};
use crate::app_log;
use crate::graph::{RootKind, SharedStore};
use crate::richtext::RewriteAction;
use crate::web::types::*;

pub async fn ai_generate_cv_handler(
    request: Json<StandardRequest<DraftRequest>>,
    store: &State<SharedStore>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<DraftResult>>, ApiError> {
    let conversation_id = request.conversation_id();
    let draft_request = request.into_inner().data;

    if draft_request.job_description.trim().is_empty() {
        return Err(ApiError::bad_request(
            "job_description is required",
            "MISSING_JOB_DESCRIPTION",
            vec!["Paste the job posting text into job_description".to_string()],
            conversation_id,
        ));
    }

    let profile = store
        .latest(RootKind::Profile)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Profile, "READ_FAILED", conversation_id.clone()))?;

    let draft = drafts.generate_draft(&profile.data, &draft_request).await;
    app_log!(
        info,
        "Drafted CV from profile {}: {} experience(s), {} skill(s), summary from {:?}",
        profile.updated_at,
        draft.cv.experience.len(),
        draft.cv.skills.len(),
        draft.summary_source
    );

    Ok(Json(DataResponse::success(
        "CV draft generated".to_string(),
        draft,
        conversation_id,
    )))
}

pub async fn ai_rewrite_handler(
    request: Json<StandardRequest<RewriteRequest>>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<RewriteResult>>, ApiError> {
    let conversation_id = request.conversation_id();
    let rewrite_request = request.into_inner().data;

    let Some(action) = RewriteAction::parse(&rewrite_request.action) else {
        return Err(ApiError::bad_request(
            format!("Unknown rewrite action: {}", rewrite_request.action),
            "INVALID_ACTION",
            vec!["Use one of: tighten, bulletize, shorten, polish".to_string()],
            conversation_id,
        ));
    };

    if rewrite_request.max_chars == Some(0) {
        return Err(ApiError::bad_request(
            "max_chars must be positive",
            "INVALID_MAX_CHARS",
            vec!["Omit max_chars to use the default limit".to_string()],
            conversation_id,
        ));
    }

    let result = drafts
        .rewrite(&rewrite_request.html, action, rewrite_request.max_chars)
        .await;
    app_log!(
        info,
        "Rewrote field with {} via {:?} ({} chars)",
        action.as_str(),
        result.source,
        result.char_count
    );

    Ok(Json(DataResponse::success(
        "Text rewritten".to_string(),
        result,
        conversation_id,
    )))
}
