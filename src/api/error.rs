//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use crate::EcommerceError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] EcommerceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e {
                EcommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
                EcommerceError::EmptyCart => StatusCode::BAD_REQUEST,
                EcommerceError::StockValidation(_) => StatusCode::CONFLICT,
                EcommerceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                EcommerceError::Decode(_) | EcommerceError::Storage(_) | EcommerceError::Money(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            ApiError::Domain(EcommerceError::StockValidation(issues)) => {
                json!({ "error": self.to_string(), "details": issues })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StockIssue;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(ApiError::from(EcommerceError::not_found("Order", "ORD-1")).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(EcommerceError::EmptyCart).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(EcommerceError::Validation("email".into())).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::from(EcommerceError::Storage("down".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = render(EcommerceError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cart is empty");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_stock_issues_are_listed() {
        let issue = StockIssue {
            product_id: 1,
            variant_id: "var-1".into(),
            product_name: "Tote".into(),
            variant_name: "Natural".into(),
            requested: 4,
            available: 2,
        };
        let (status, body) = render(EcommerceError::StockValidation(vec![issue]).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"][0]["variantId"], "var-1");
        assert_eq!(body["details"][0]["available"], 2);
    }
}
