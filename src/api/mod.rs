// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    context::gateway::attach_gateway_context,
    crypto::Envelope,
    models::{NoteDto, StatusResponse},
    state::AppState,
};

pub mod health;
pub mod notes;

pub fn router(state: AppState) -> Router {
    let note_routes = Router::new()
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .layer(middleware::from_fn(attach_gateway_context));

    Router::new()
        .merge(note_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        notes::list_notes,
        notes::get_note,
        notes::create_note,
        notes::update_note,
        notes::delete_note,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Envelope,
            NoteDto,
            StatusResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Notes", description = "Encrypted note storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::gateway::{SCHEMA_HEADER, TRANSPORT_KEY_HEADER};
    use crate::crypto::{FieldCipher, FieldKey, TransportKey, KEY_LEN};
    use crate::storage::NoteDatabase;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use base64ct::{Base64, Encoding};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const RAW_KEY: [u8; KEY_LEN] = [9u8; KEY_LEN];

    fn app() -> Router {
        let store = Arc::new(NoteDatabase::in_memory().unwrap());
        router(AppState::new(store, FieldCipher::new(FieldKey::generate())))
    }

    fn transport_key() -> TransportKey {
        TransportKey::from_bytes(&RAW_KEY).unwrap()
    }

    fn note_body(note: &str) -> Body {
        let dto = NoteDto {
            id: None,
            created_at: None,
            updated_at: None,
            note: note.to_string(),
        };
        let envelope = Envelope::seal(&transport_key(), &dto).unwrap();
        Body::from(serde_json::to_vec(&envelope).unwrap())
    }

    fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(SCHEMA_HEADER, "tenant_a")
            .header(TRANSPORT_KEY_HEADER, Base64::encode_string(&RAW_KEY))
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn open<T: serde::de::DeserializeOwned>(body: Value) -> T {
        let envelope: Envelope = serde_json::from_value(body).unwrap();
        envelope.open(&transport_key()).unwrap()
    }

    #[tokio::test]
    async fn note_lifecycle_over_http() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/notes", note_body("first")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let created: NoteDto = open(json(response).await);
        assert_eq!(created.id, Some(1));

        let response = app
            .clone()
            .oneshot(request(Method::PUT, "/notes/1", note_body("second")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: NoteDto = open(json(response).await);
        assert_eq!(updated.note, "second");

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/notes", Body::empty()))
            .await
            .unwrap();
        let listed: Vec<NoteDto> = open(json(response).await);
        assert_eq!(listed, vec![updated]);

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/notes/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "Success");
        assert_eq!(body["message"], "Note deleted successfully!");

        let response = app
            .oneshot(request(Method::DELETE, "/notes/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["code"], 404);
        assert_eq!(body["status"], "Error");
    }

    #[tokio::test]
    async fn bad_id_is_400_with_status_body() {
        let response = app()
            .oneshot(request(Method::GET, "/notes/abc", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["code"], 400);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn missing_context_is_500() {
        let request = Request::builder()
            .uri("/notes/1")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["status"], "Error");
    }

    #[tokio::test]
    async fn malformed_list_query_is_400() {
        let response = app()
            .oneshot(request(Method::GET, "/notes?limit=lots", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_413_with_status_body() {
        let body = Body::from(vec![b'a'; 3 * 1024 * 1024]);
        let response = app()
            .oneshot(request(Method::POST, "/notes", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json(response).await;
        assert_eq!(body["code"], 413);
        assert_eq!(body["status"], "Error");
    }

    #[tokio::test]
    async fn undecodable_path_is_400_with_status_body() {
        for method in [Method::GET, Method::DELETE] {
            let response = app()
                .oneshot(request(method.clone(), "/notes/%FF", Body::empty()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
            let body = json(response).await;
            assert_eq!(body["code"], 400);
            assert_eq!(body["status"], "Error");
        }
    }

    #[tokio::test]
    async fn time_window_accepts_utc_and_encoded_offsets() {
        let app = app();
        app.clone()
            .oneshot(request(Method::POST, "/notes", note_body("dated")))
            .await
            .unwrap();

        for query in [
            "created_after=2000-01-01T00:00:00Z",
            "created_after=2000-01-01T02:00:00%2B02:00",
        ] {
            let uri = format!("/notes?{query}");
            let response = app
                .clone()
                .oneshot(request(Method::GET, &uri, Body::empty()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{query}");
            let listed: Vec<NoteDto> = open(json(response).await);
            assert_eq!(listed.len(), 1, "{query}");
        }
    }

    #[tokio::test]
    async fn health_and_docs_are_served() {
        let app = app();
        for uri in ["/health/live", "/health/ready", "/api-doc/openapi.json"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
