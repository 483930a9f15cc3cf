//! Book endpoints
//!
//! `POST /books` runs the submitted books through the batch pipeline and
//! reports per-book failures alongside the stored records.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cloudlib_core::{Book, BookFilters, LibraryError};
use serde::Serialize;
use serde_json::Value;

use crate::http::error::{ApiError, INTERNAL_ERROR_MESSAGE};
use crate::http::extractors::ValidBookId;
use crate::http::server::AppState;
use crate::models::validate_batch;

/// Outcome of a batch store
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub stored: Vec<Book>,
    pub errors: Vec<StoreFailure>,
}

/// One book that could not be stored
#[derive(Debug, Serialize)]
pub struct StoreFailure {
    pub index: usize,
    pub error: String,
}

/// List response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<Book>,
    pub total: usize,
}

/// Accept either one book object or an array of them
fn parse_books(payload: Value) -> Result<Vec<Book>, ApiError> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| ApiError::BadRequest {
                    message: format!("book #{}: {}", index, e),
                })
            })
            .collect(),
        book @ Value::Object(_) => serde_json::from_value(book)
            .map(|book| vec![book])
            .map_err(|e| ApiError::BadRequest {
                message: format!("book #0: {}", e),
            }),
        _ => Err(ApiError::BadRequest {
            message: "expected a book object or an array of books".into(),
        }),
    }
}

/// Text reported to the client for a failed unit.
///
/// Store failures are logged and replaced by a generic message, the same
/// as single-call storage errors. Not-found and timeouts pass through.
fn client_message(index: usize, error: &LibraryError) -> String {
    match error {
        LibraryError::StorageFailure { .. } if !error.is_timeout() => {
            tracing::error!(index, error = %error, "Storage error");
            INTERNAL_ERROR_MESSAGE.to_string()
        }
        _ => error.to_string(),
    }
}

/// POST /books - store one or many books
///
/// 200 when every book was stored, 207 when some failed.
async fn store_books(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let Json(payload) = payload?;
    let mut books = parse_books(payload)?;
    validate_batch(&mut books)?;

    let result = state.service.store_batch(books).await;

    let errors: Vec<StoreFailure> = result
        .error
        .map(|e| e.into_failures())
        .unwrap_or_default()
        .into_iter()
        .map(|f| StoreFailure {
            index: f.index,
            error: client_message(f.index, &f.error),
        })
        .collect();

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((
        status,
        Json(StoreResponse {
            stored: result.successes,
            errors,
        }),
    ))
}

/// GET /books - list books matching the query filters
async fn list_books(
    State(state): State<Arc<AppState>>,
    filters: Result<Query<BookFilters>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(filters) = filters?;
    let items = state.service.list(&filters).await?;

    Ok(Json(ListResponse {
        total: items.len(),
        items,
    }))
}

/// GET /books/{id}
async fn get_book(
    State(state): State<Arc<AppState>>,
    ValidBookId(id): ValidBookId,
) -> Result<Json<Book>, ApiError> {
    let book = state.service.get_by_id(id).await?;
    Ok(Json(book))
}

/// DELETE /books/{id}
async fn delete_book(
    State(state): State<Arc<AppState>>,
    ValidBookId(id): ValidBookId,
) -> Result<StatusCode, ApiError> {
    state.service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Book routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/books", get(list_books).post(store_books))
        .route("/books/{id}", get(get_book).delete(delete_book))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use cloudlib_core::{BookStore, LibraryService, MemoryBookStore, PipelineConfig, Result};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::http::server::{build_router, ServerConfig, MAX_BODY_BYTES};
    use crate::http::AppState;

    fn app_with(store: Arc<dyn BookStore>) -> Router {
        let service =
            LibraryService::new(Some(store), PipelineConfig::new(3, Duration::from_secs(2)))
                .unwrap();
        build_router(AppState::new(service, None), &ServerConfig::default())
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryBookStore::new()))
    }

    fn book_json(isbn: &str, title: &str) -> Value {
        json!({
            "isbn": isbn,
            "title": title,
            "lang": "swedish",
            "translator": "Jan Stolpe",
            "authors": ["Albert Camus"],
            "pages": 254,
            "publisher": "Albert Bonniers"
        })
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/books")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Store stub that rejects one ISBN
    struct RejectingStore {
        inner: MemoryBookStore,
        reject: &'static str,
    }

    #[async_trait]
    impl BookStore for RejectingStore {
        async fn store(&self, book: Book) -> Result<Book> {
            if book.isbn == self.reject {
                return Err(LibraryError::storage("duplicate key value"));
            }
            self.inner.store(book).await
        }

        async fn get(&self, id: i64) -> Result<Book> {
            self.inner.get(id).await
        }

        async fn delete(&self, book: &Book) -> Result<()> {
            self.inner.delete(book).await
        }

        async fn list(&self, filters: &BookFilters) -> Result<Vec<Book>> {
            self.inner.list(filters).await
        }
    }

    #[tokio::test]
    async fn store_then_get() {
        let app = app();
        let payload = json!([
            book_json("9789100187934", "Pesten"),
            book_json("0-306-40615-2", "Främlingen")
        ]);

        let (status, body) = send(&app, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stored"].as_array().unwrap().len(), 2);
        assert!(body["errors"].as_array().unwrap().is_empty());

        let id = body["stored"][0]["id"].as_i64().unwrap();
        let (status, book) = send(&app, get(&format!("/books/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(book["id"], id);
        assert!(book["added_date"].is_string());
    }

    #[tokio::test]
    async fn single_object_is_accepted() {
        let app = app();
        let (status, body) =
            send(&app, post(book_json("9789100187934", "Pesten").to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stored"][0]["title"], "Pesten");
    }

    #[tokio::test]
    async fn partial_failure_is_multi_status() {
        let app = app_with(Arc::new(RejectingStore {
            inner: MemoryBookStore::new(),
            reject: "9789100187934",
        }));
        let payload = json!([
            book_json("0306406152", "Främlingen"),
            book_json("9789100187934", "Pesten"),
            book_json("9780141182001", "The Plague")
        ]);

        let (status, body) = send(&app, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(body["stored"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][0]["index"], 1);
        assert_eq!(body["errors"][0]["error"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("duplicate key value"));
    }

    #[tokio::test]
    async fn isbn_spellings_resolve_to_one_book() {
        let app = app();

        let (status, first) =
            send(&app, post(book_json("0-306-40615-2", "Främlingen").to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, second) =
            send(&app, post(book_json("0306406152", "Främlingen").to_string())).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(first["stored"][0]["id"], second["stored"][0]["id"]);
        assert_eq!(first["stored"][0]["isbn"], "0306406152");

        let (_, body) = send(&app, get("/books")).await;
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn invalid_book_names_its_index() {
        let app = app();
        let mut bad = book_json("9789100187934", "Pesten");
        bad["pages"] = json!(0);
        let payload = json!([book_json("0306406152", "Främlingen"), bad]);

        let (status, body) = send(&app, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().starts_with("book #1:"));
    }

    #[tokio::test]
    async fn unknown_field_is_bad_request() {
        let app = app();
        let payload = json!([{"can_this_be_marshalled": false}]);

        let (status, body) = send(&app, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("book #0:"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = send(&app(), post("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let padding = "x".repeat(MAX_BODY_BYTES + 1);
        let payload = json!({ "title": padding }).to_string();

        let (status, _) = send(&app(), post(payload)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn missing_book_is_404() {
        let (status, body) = send(&app(), get("/books/42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let (status, _) = send(&app(), get("/books/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_applies_filters() {
        let app = app();
        let mut other = book_json("0306406152", "Främlingen");
        other["lang"] = json!("french");
        let payload = json!([book_json("9789100187934", "Pesten"), other]);
        send(&app, post(payload.to_string())).await;

        let (status, body) = send(&app, get("/books")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);

        let (status, body) = send(&app, get("/books?lang=FRENCH")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["title"], "Främlingen");

        let (status, _) = send(&app, get("/books?id=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_then_gone() {
        let app = app();
        let (_, body) = send(&app, post(book_json("9789100187934", "Pesten").to_string())).await;
        let id = body["stored"][0]["id"].as_i64().unwrap();

        let delete = || {
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/books/{}", id))
                .body(Body::empty())
                .unwrap()
        };

        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/books")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app(), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_reports_memory_store() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "not_configured");
    }
}
