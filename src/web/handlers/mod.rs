pub mod ai_handlers;
pub mod cv_handlers;
pub mod document_handlers;
pub mod profile_handlers;
pub mod system_handlers;

pub use ai_handlers::*;
pub use cv_handlers::*;
pub use document_handlers::*;
pub use profile_handlers::*;
pub use system_handlers::*;

use crate::app_log;
use crate::types::{CvData, CvPayload};
use crate::web::types::ApiError;

/// Boundary conversion shared by every handler that accepts a CV payload
pub(crate) fn validated(
    payload: CvPayload,
    conversation_id: Option<String>,
) -> Result<CvData, ApiError> {
    payload.into_cv_data().map_err(|errors| {
        app_log!(
            info,
            "Rejected payload with {} validation error(s): {}",
            errors.len(),
            errors
                .iter()
                .map(|e| e.field.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        ApiError::validation(errors, conversation_id)
    })
}
