use crate::{
    notification::{notification_dto::*, notification_handlers as handlers},
    state::AppState,
};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_notifications,
        handlers::create_notification,
        handlers::get_notification,
        handlers::update_notification,
        handlers::mark_notification_read,
        handlers::delete_notification,
        handlers::clear_notifications,
        handlers::mark_all_notifications_read,
        handlers::get_unread_count,
        handlers::render_notifications,
    ),
    components(
        schemas(
            CreateNotificationRequest,
            UpdateNotificationRequest,
            NotificationResponse,
            UnreadCountResponse,
        )
    ),
    tags(
        (name = "notifications", description = "Notification endpoints")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let notification_routes = Router::new()
        .route(
            "/",
            get(handlers::get_notifications)
                .post(handlers::create_notification)
                .delete(handlers::clear_notifications),
        )
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/read-all", post(handlers::mark_all_notifications_read))
        .route("/render", get(handlers::render_notifications))
        .route(
            "/:id",
            get(handlers::get_notification)
                .put(handlers::update_notification)
                .delete(handlers::delete_notification),
        )
        .route("/:id/read", patch(handlers::mark_notification_read));

    let api_routes = Router::new().nest("/users/:user_id/notifications", notification_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::notification::{DatabaseTarget, MessageCatalog, MessageText, NotificationManager};
    use crate::state::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let catalog = Arc::new(
            MessageCatalog::new().with_type("like", MessageText::Plain("{who} liked it".into())),
        );
        let target = DatabaseTarget::new(test_pool().await, catalog);
        let mut config = Config::default();
        config.render.item_template = "{text} ({notification.type})".to_string();

        create_router(AppState {
            config: Arc::new(config),
            notification_manager: NotificationManager::new(Arc::new(target)),
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users/5/notifications",
            Some(json!({ "type": "like", "data": { "who": "max" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["text"], json!("max liked it"));
        assert_eq!(created["is_read"], json!(false));

        let (status, body) = send(&app, Method::GET, "/api/users/5/notifications", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_type() {
        let app = app().await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users/5/notifications",
            Some(json!({ "type": "", "data": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_unknown_notification_is_404() {
        let app = app().await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/users/5/notifications/999",
            Some(json!({ "type": "like", "data": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_and_delete_flow() {
        let app = app().await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/users/5/notifications",
            Some(json!({ "type": "like", "data": {} })),
        )
        .await;
        let id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/users/5/notifications/{id}/read"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/users/5/notifications/unread-count",
            None,
        )
        .await;
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ "unread": 0 }));

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/users/5/notifications/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/users/5/notifications/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_endpoint() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/5/notifications/render",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "No notifications available.");

        send(
            &app,
            Method::POST,
            "/api/users/5/notifications",
            Some(json!({ "type": "like", "data": { "who": "ivy" } })),
        )
        .await;

        let (_, body) = send(&app, Method::GET, "/api/users/5/notifications/render", None).await;
        assert_eq!(body, "ivy liked it (like)");
    }

    #[tokio::test]
    async fn test_clear_all_and_read_all() {
        let app = app().await;
        for _ in 0..2 {
            send(
                &app,
                Method::POST,
                "/api/users/5/notifications",
                Some(json!({ "type": "like", "data": {} })),
            )
            .await;
        }

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users/5/notifications/read-all",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(
            &app,
            Method::GET,
            "/api/users/5/notifications/unread-count",
            None,
        )
        .await;
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ "unread": 0 }));

        let (status, _) = send(&app, Method::DELETE, "/api/users/5/notifications", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, Method::GET, "/api/users/5/notifications", None).await;
        assert_eq!(body, "[]");
    }
}
