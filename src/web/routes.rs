//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Filters and the feed they drive
        .route(
            "/filters",
            get(handlers::filters)
                .post(handlers::apply_filter)
                .delete(handlers::reset_filters),
        )
        .route("/feed", get(handlers::feed))
        // Listings
        .route("/advertisements", get(handlers::advertisements))
        .route("/advertisements/count", get(handlers::count))
        .route("/advertisements/mine", get(handlers::own_advertisements))
        .route("/advertisements/:id", get(handlers::advertisement))
        .route("/advertisements/:id/contact", post(handlers::contact_seller))
        // Account
        .route("/session", post(handlers::login).delete(handlers::logout))
        .route("/favorites", get(handlers::favorites))
        .route(
            "/favorites/:id",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AdvertisementStore, CacheKind, MemoryStore};
    use crate::config::Settings;
    use crate::models::fixtures::{advertisement, response_json};
    use crate::network::{BackendClient, SessionStore, StaticReachability};
    use crate::search::Search;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        router: Router,
        state: AppState,
        store: Arc<MemoryStore>,
        reachability: StaticReachability,
    }

    fn harness(server: &MockServer) -> Harness {
        let mut settings = Settings::default();
        settings.backend.api_host = server.uri();
        settings.backend.application_id = "APP".to_string();
        settings.backend.rest_api_key = "KEY".to_string();

        let client = BackendClient::with_settings(&settings, SessionStore::new()).unwrap();
        let store = Arc::new(MemoryStore::new());
        let reachability = StaticReachability::new(true);
        let search = Search::new(client, store.clone(), Arc::new(reachability.clone()));
        let state = AppState::new(settings, search).unwrap();

        Harness {
            router: create_router(state.clone()),
            state,
            store,
            reachability,
        }
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn sign_in(server: &MockServer, router: &Router) {
        Mock::given(method("POST"))
            .and(path("/APP/KEY/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "objectId": "u1",
                "email": "jane@example.com",
                "user-token": "tok",
            })))
            .mount(server)
            .await;
        let (status, user) = call(
            router,
            Method::POST,
            "/session",
            Some(json!({ "login": "jane@example.com", "password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["objectId"], "u1");
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let (status, body) = call(&h.router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["online"], true);
    }

    #[tokio::test]
    async fn test_advertisements_forward_facets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement"))
            .and(query_param("where", "transportName = 'BMW' and price >= 5000"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([response_json("a1", "BMW", "X5", 25_000)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement/count"))
            .and(query_param("where", "transportName = 'BMW' and price >= 5000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(7)))
            .mount(&server)
            .await;

        let h = harness(&server);
        let (status, page) = call(
            &h.router,
            Method::GET,
            "/advertisements?brand=BMW&price_min=5000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 7);
        assert_eq!(page["advertisements"][0]["object_id"], "a1");

        let (status, count) = call(
            &h.router,
            Method::GET,
            "/advertisements/count?brand=BMW&price_min=5000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count["count"], 7);
    }

    #[tokio::test]
    async fn test_backend_errors_map_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "code": 1000, "message": "Entity not found" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let h = harness(&server);
        let (status, body) = call(&h.router, Method::GET, "/advertisements/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Entity not found");

        let (status, _) = call(&h.router, Method::GET, "/advertisements/broken", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = call(&h.router, Method::GET, "/advertisements?fuel_type=steam", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_offline_serves_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server);
        h.reachability.set(false);
        h.store
            .synchronize(
                CacheKind::Feed,
                vec![
                    advertisement("a1", "BMW", "X5", 25_000),
                    advertisement("a2", "Audi", "A6", 30_000),
                ],
            )
            .await
            .unwrap();

        let (status, page) = call(&h.router, Method::GET, "/advertisements?brand=audi", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["advertisements"][0]["object_id"], "a2");

        let (status, ad) = call(&h.router, Method::GET, "/advertisements/a1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ad["transport_name"], "BMW");
    }

    #[tokio::test]
    async fn test_favorites_require_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement"))
            .and(query_param("where", "Users[favorites].objectId = 'u1'"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([response_json("f1", "BMW", "X5", 25_000)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/users/logout"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let h = harness(&server);
        let (status, _) = call(&h.router, Method::GET, "/favorites", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        sign_in(&server, &h.router).await;
        let (status, favorites) = call(&h.router, Method::GET, "/favorites", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(favorites[0]["object_id"], "f1");

        let (status, _) = call(&h.router, Method::DELETE, "/session", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.state.search.client().session().current().is_none());
    }

    #[tokio::test]
    async fn test_contact_seller_sends_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement/a1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(response_json("a1", "BMW", "X5", 25_000)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Users/owner-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "objectId": "owner-1",
                "email": "seller@example.com",
                "name": "Ivan",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/APP/KEY/messaging/email"))
            .and(body_partial_json(json!({
                "subject": "BMW X5: new message from Jane",
                "to": ["seller@example.com"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "queued" })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let (status, _) = call(
            &h.router,
            Method::POST,
            "/advertisements/a1/contact",
            Some(json!({
                "sender_name": "Jane",
                "sender_email": "jane@example.com",
                "message": "Is it still available?",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, _) = call(
            &h.router,
            Method::POST,
            "/advertisements/a1/contact",
            Some(json!({
                "sender_name": "Jane",
                "sender_email": "not-an-email",
                "message": "hi",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_filter_selection_drives_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/APP/KEY/data/Advertisement"))
            .and(query_param("where", "transportName = 'BMW'"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([response_json("a1", "BMW", "X5", 25_000)])),
            )
            .mount(&server)
            .await;

        let h = harness(&server);
        let mut rx = h.state.feed.subscribe();
        let (status, filters) = call(
            &h.router,
            Method::POST,
            "/filters",
            Some(json!({ "facet": "brand", "name": "BMW" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(filters["brands"][1]["value"], "BMW");
        assert_eq!(filters["brands"][1]["is_selected"], true);

        tokio::time::timeout(Duration::from_secs(2), async {
            while !matches!(*rx.borrow_and_update(), crate::search::SearchState::Loaded(_)) {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        let (_, feed) = call(&h.router, Method::GET, "/feed", None).await;
        assert_eq!(feed["state"], "loaded");
        assert_eq!(feed["data"][0]["object_id"], "a1");
    }
}
