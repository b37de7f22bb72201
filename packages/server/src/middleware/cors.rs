//! Cross-origin policy built from [`CorsOrigins`].

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsOrigins;

/// The storefront's CORS layer: configured origins, the four CRUD methods,
/// and `Content-Type` as the only request header.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!("ignoring unusable CORS origin {o:?}");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::config::{CorsOrigins, ServerConfig};
    use crate::router::build_router;
    use crate::storage::memory::MemoryStorage;

    async fn preflight(origins: CorsOrigins, origin: &str) -> Option<String> {
        let config = ServerConfig {
            cors_origins: origins,
            ..ServerConfig::for_tests()
        };
        let app = build_router(Arc::new(MemoryStorage::new()), config);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/orders")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        resp.headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn listed_origin_is_allowed() {
        let origins = CorsOrigins::List(vec!["https://shop.example".into()]);
        assert_eq!(
            preflight(origins.clone(), "https://shop.example").await.as_deref(),
            Some("https://shop.example")
        );
        assert_eq!(preflight(origins, "https://evil.example").await, None);
    }

    #[tokio::test]
    async fn wildcard_allows_everyone() {
        assert_eq!(
            preflight(CorsOrigins::Any, "https://anyone.example").await.as_deref(),
            Some("*")
        );
    }
}
