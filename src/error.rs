//! HTTP error rendering for the pricing API.
//!
//! Every pricing error renders as the structured `{error_type, message,
//! details}` payload, so the surrounding system can map each taxonomy value
//! to an actionable message regardless of which back-end produced it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::pricing::responses::PricingErrorResponse;
use crate::pricing::services::PricingError;

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = match &self {
            PricingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PricingError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::MissingVendorAgreement { .. } => StatusCode::NOT_FOUND,
            PricingError::MissingPrice { .. } => StatusCode::NOT_FOUND,
            PricingError::ConfigurationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::ServiceUnavailable { .. } => {
                tracing::error!("Pricing unavailable with no fallback: {}", self);
                StatusCode::SERVICE_UNAVAILABLE
            }
            PricingError::Storage(e) => {
                tracing::error!("Storage error during pricing: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PricingError::Internal(msg) => {
                tracing::error!("Internal pricing error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(PricingErrorResponse::from(&self))).into_response()
    }
}
