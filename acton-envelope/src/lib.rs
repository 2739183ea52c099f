//! # acton-envelope
//!
//! Uniform JSON response envelopes for axum services.
//!
//! Every response, success or failure, has the same shape:
//! `{"status": "ok" | "error", "data": ..., "message": ..., "meta": ...}`.
//!
//! ## Features
//!
//! - **Field whitelisting**: records are serialized through an explicit
//!   [`FieldSpec`]; nothing outside the list ever reaches the client
//! - **Pagination**: `page` / `page_size` query parameters with configurable
//!   defaults, clamping and an optional record cap
//! - **API errors**: return [`ApiError`] from anywhere in a handler with `?`;
//!   axum renders it as an error envelope with the matching status code
//! - **Configuration**: Figment layering of defaults, TOML files and
//!   environment variables
//!
//! ## Example
//!
//! ```rust
//! use acton_envelope::prelude::*;
//! use axum::{extract::Path, routing::get, Router};
//!
//! struct Task {
//!     id: u64,
//!     title: String,
//!     owner_token: String,
//! }
//!
//! impl_record!(Task { id, title });
//!
//! async fn show_task(Path(id): Path<u64>) -> Result<Envelope> {
//!     if id != 1 {
//!         return Err(ApiError::not_found().with_message("Task not found").into());
//!     }
//!
//!     let task = Task { id, title: "write docs".into(), owner_token: "secret".into() };
//!     let fields = FieldSpec::new(["id", "title"])?;
//!     ResponseBuilder::default().ok(&task, &fields)
//! }
//!
//! let app: Router = Router::new().route("/tasks/{id}", get(show_task));
//! ```

pub mod api_error;
pub mod builder;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod observability;
pub mod pagination;
pub mod record;

pub use api_error::{ApiError, ApiErrorKind};
pub use builder::ResponseBuilder;
pub use config::{Config, LoggingConfig};
pub use envelope::{Envelope, EnvelopeStatus, PageMeta};
pub use error::{Error, Result, SerializationError};
pub use fields::FieldSpec;
pub use observability::{init_tracing, shutdown_tracing};
pub use pagination::{
    PageOptions, PageQuery, PageRequest, PageSource, PaginationConfig, RequestContext,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PAGE_PARAM, PAGE_SIZE_PARAM,
};
pub use record::{FieldTable, Record};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
    pub use serde_json;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api_error::{ApiError, ApiErrorKind};
    pub use crate::builder::ResponseBuilder;
    pub use crate::config::Config;
    pub use crate::envelope::{Envelope, EnvelopeStatus, PageMeta};
    pub use crate::error::{Error, Result, SerializationError};
    pub use crate::fields::FieldSpec;
    pub use crate::impl_record;
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::pagination::{
        PageOptions, PageQuery, PageSource, PaginationConfig, RequestContext,
    };
    pub use crate::record::{FieldTable, Record};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use axum::{
        body::{to_bytes, Body},
        extract::{Path, State},
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Task {
        id: u64,
        title: String,
        #[allow(dead_code)]
        owner_token: String,
    }

    impl_record!(Task { id, title });

    struct AppState {
        responses: ResponseBuilder,
        fields: FieldSpec,
        tasks: Vec<Task>,
    }

    async fn show_task(
        State(state): State<Arc<AppState>>,
        Path(id): Path<u64>,
    ) -> Result<Envelope> {
        let task = state
            .tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| ApiError::not_found().with_message("Task not found"))?;
        state.responses.ok(task, &state.fields)
    }

    async fn list_tasks(State(state): State<Arc<AppState>>, query: PageQuery) -> Result<Envelope> {
        state.responses.page(&query, &state.tasks, &state.fields)
    }

    async fn admin_only() -> std::result::Result<Envelope, ApiError> {
        Err(ApiError::forbidden())
    }

    async fn broken() -> std::result::Result<Envelope, ApiError> {
        Err(ApiError::internal().with_message("connection pool exhausted"))
    }

    fn app() -> Router {
        let state = AppState {
            responses: ResponseBuilder::default(),
            fields: FieldSpec::new(["id", "title"]).unwrap(),
            tasks: (1..=25)
                .map(|id| Task {
                    id,
                    title: format!("task {}", id),
                    owner_token: format!("token-{}", id),
                })
                .collect(),
        };

        Router::new()
            .route("/tasks", get(list_tasks))
            .route("/tasks/{id}", get(show_task))
            .route("/admin", get(admin_only))
            .route("/broken", get(broken))
            .with_state(Arc::new(state))
    }

    async fn call(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_handler_success() {
        let (status, body) = call("/tasks/5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "ok", "data": {"id": 5, "title": "task 5"}, "message": null})
        );
    }

    #[tokio::test]
    async fn test_handler_not_found() {
        let (status, body) = call("/tasks/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"status": "error", "data": null, "message": "Task not found"})
        );
    }

    #[tokio::test]
    async fn test_handler_default_message() {
        let (status, body) = call("/admin").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden");
    }

    #[tokio::test]
    async fn test_handler_internal_hides_diagnostic() {
        let (status, body) = call("/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"status": "error", "data": null, "message": "Internal error"})
        );
    }

    #[tokio::test]
    async fn test_handler_page() {
        let (status, body) = call("/tasks?page=2&page_size=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["meta"],
            json!({"page_number": 2, "page_size": 10, "total_count": 25, "total_pages": 3})
        );
        let ids: Vec<u64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
        assert!(body["data"][0].get("owner_token").is_none());
    }

    #[tokio::test]
    async fn test_handler_page_bad_request() {
        let (status, body) = call("/tasks?page=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["message"], "Query parameter `page` must be an integer");
    }
}
