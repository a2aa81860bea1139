// src/web/handlers/profile_handlers.rs
//! The profile is the user's master record. Only the most recent one is
//! addressable without a timestamp.

use rocket::serde::json::Json;
use rocket::State;
use tracing::Instrument;

use super::validated;
use crate::graph::{RootKind, SharedStore};
use crate::types::{CvPayload, Record};
use crate::web::types::*;
use crate::{app_log, app_span};

async fn latest_profile(
    store: &SharedStore,
    conversation_id: Option<String>,
) -> Result<Record, ApiError> {
    store
        .latest(RootKind::Profile)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Profile, "READ_FAILED", conversation_id))
}

pub async fn get_profile_handler(
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    let record = latest_profile(store, None).await?;
    app_log!(debug, "Loaded latest profile {}", record.updated_at);
    Ok(Json(DataResponse::success(
        "Profile loaded".to_string(),
        record,
        None,
    )))
}

pub async fn get_profile_by_version_handler(
    timestamp: &str,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    let record = store
        .find_by_version(RootKind::Profile, timestamp)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Profile, "READ_FAILED", None))?;

    Ok(Json(DataResponse::success(
        "Profile loaded".to_string(),
        record,
        None,
    )))
}

pub async fn create_profile_handler(
    request: Json<StandardRequest<CvPayload>>,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<SavedRecord>>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;

    let record = store
        .create(RootKind::Profile, &data)
        .instrument(app_span!("create_profile", name = %data.personal_info.name))
        .await
        .map_err(|e| {
            ApiError::from_store(e, RootKind::Profile, "SAVE_FAILED", conversation_id.clone())
        })?;

    app_log!(info, "Created profile {} at {}", record.id, record.updated_at);
    Ok(Json(DataResponse::success(
        "Profile created".to_string(),
        SavedRecord {
            id: record.id,
            updated_at: record.updated_at,
        },
        conversation_id,
    )))
}

pub async fn update_profile_handler(
    request: Json<StandardRequest<CvPayload>>,
    if_match: IfMatch,
    store: &State<SharedStore>,
) -> Result<Json<DataResponse<Record>>, ApiError> {
    let conversation_id = request.conversation_id();
    let data = validated(request.into_inner().data, conversation_id.clone())?;

    let current = latest_profile(store, conversation_id.clone()).await?;
    let record = store
        .replace(RootKind::Profile, &current.id, &data, if_match.version())
        .instrument(app_span!("update_profile", id = %current.id, previous = %current.updated_at))
        .await
        .map_err(|e| {
            ApiError::from_store(e, RootKind::Profile, "UPDATE_FAILED", conversation_id.clone())
        })?;

    app_log!(
        info,
        "Replaced profile {}: {} -> {}",
        record.id,
        current.updated_at,
        record.updated_at
    );
    Ok(Json(DataResponse::success(
        "Profile updated".to_string(),
        record,
        conversation_id,
    )))
}

pub async fn delete_profile_handler(
    store: &State<SharedStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    let current = latest_profile(store, None).await?;

    let removed = store
        .delete(RootKind::Profile, &current.id)
        .await
        .map_err(|e| ApiError::from_store(e, RootKind::Profile, "DELETE_FAILED", None))?;
    if !removed {
        return Err(ApiError::not_found(RootKind::Profile, None));
    }

    app_log!(info, "Deleted profile {}", current.id);
    Ok(Json(ActionResponse::success(
        "Profile deleted".to_string(),
        "profile_deleted".to_string(),
        None,
    )
    .with_next_actions(vec!["POST /api/profile".to_string()])))
}
