// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway context middleware.
//!
//! Stands in for the upstream authentication layer. The service is deployed
//! behind a trusted gateway that has already authenticated the session and
//! forwards the tenant schema and the session's transport key as headers.
//! This middleware moves them into request extensions as raw values and
//! strips them from the header map so nothing downstream can read or echo
//! them.
//!
//! No validation happens here; that is [`TenantContext`](super::TenantContext)'s job.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

use super::{RawSchema, RawTransportKey};

/// Header carrying the tenant schema.
pub const SCHEMA_HEADER: HeaderName = HeaderName::from_static("x-tenant-schema");

/// Header carrying the base64 transport key.
pub const TRANSPORT_KEY_HEADER: HeaderName = HeaderName::from_static("x-transport-key");

fn take_header(headers: &mut HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.remove(name)?;
    match value.to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            tracing::debug!(header = %name, "Dropping non-ASCII gateway header");
            None
        }
    }
}

/// Attach gateway-supplied context values to the request.
pub async fn attach_gateway_context(mut request: Request, next: Next) -> Response {
    let headers = request.headers_mut();
    let schema = take_header(headers, &SCHEMA_HEADER);
    let transport_key = take_header(headers, &TRANSPORT_KEY_HEADER);

    let extensions = request.extensions_mut();
    if let Some(schema) = schema {
        extensions.insert(RawSchema(schema));
    }
    if let Some(key) = transport_key {
        extensions.insert(RawTransportKey(key));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextError, TenantContext};
    use crate::crypto::KEY_LEN;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use base64ct::{Base64, Encoding};
    use tower::ServiceExt;

    async fn echo_context(request: axum::extract::Request) -> (StatusCode, String) {
        let leaked = request.headers().contains_key(&TRANSPORT_KEY_HEADER)
            || request.headers().contains_key(&SCHEMA_HEADER);
        match TenantContext::resolve(request.extensions()) {
            Ok(context) if !leaked => (StatusCode::OK, context.schema().to_string()),
            Ok(_) => (StatusCode::CONFLICT, "headers leaked".to_string()),
            Err(ContextError::MissingSchema) => {
                (StatusCode::BAD_REQUEST, "missing schema".to_string())
            }
            Err(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    fn app() -> Router {
        Router::new()
            .route("/context", get(echo_context))
            .layer(middleware::from_fn(attach_gateway_context))
    }

    #[tokio::test]
    async fn moves_headers_into_extensions() {
        let request = Request::builder()
            .uri("/context")
            .header(SCHEMA_HEADER, "tenant_a")
            .header(TRANSPORT_KEY_HEADER, Base64::encode_string(&[1u8; KEY_LEN]))
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"tenant_a");
    }

    #[tokio::test]
    async fn absent_headers_leave_context_missing() {
        let request = Request::builder().uri("/context").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"missing schema");
    }
}
