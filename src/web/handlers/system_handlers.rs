// src/web/handlers/system_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::ai::DraftService;
use crate::app_log;
use crate::documents::DocumentGenerator;
use crate::graph::SharedStore;
use crate::types::Theme;
use crate::web::types::*;

pub async fn themes_handler(generator: &State<DocumentGenerator>) -> Json<DataResponse<Vec<ThemeInfo>>> {
    let themes: Vec<ThemeInfo> = Theme::ALL
        .iter()
        .map(|theme| ThemeInfo {
            id: theme.as_str(),
            description: theme.description(),
            primary_color: format!("#{}", theme.primary_color()),
            font_family: theme.font_family(),
            custom_print_template: generator.templates().template_exists(theme.as_str()),
        })
        .collect();

    Json(DataResponse::success(
        format!("{} themes available", themes.len()),
        themes,
        None,
    ))
}

pub async fn health_handler(
    store: &State<SharedStore>,
    drafts: &State<DraftService>,
) -> Result<Json<DataResponse<HealthData>>, ApiError> {
    match store.health_check().await {
        Ok(()) => {
            app_log!(debug, "Health check ok ({})", store.backend_name());
            Ok(Json(DataResponse::success(
                "OK".to_string(),
                HealthData {
                    status: "ok",
                    store: store.backend_name(),
                    store_reachable: true,
                    ai_enabled: drafts.ai_enabled(),
                },
                None,
            )))
        }
        Err(e) => {
            app_log!(error, "Health check failed for {}: {}", store.backend_name(), e);
            Err(ApiError::new(
                Status::ServiceUnavailable,
                "Store unavailable",
                "STORE_UNAVAILABLE",
                vec!["Check the database connection settings".to_string()],
                None,
            ))
        }
    }
}
