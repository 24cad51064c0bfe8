//src/main.rs

use axum::{
    Json, Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod testing;

use crate::config::{AppState, Settings};
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("database migrations applied");

    if let Some(path) = &settings.area_seed_path {
        let written = app_state.area_service.seed_from_file(path).await?;
        tracing::info!(rows = written, path = %path.display(), "area seed checked");
    }

    let app = router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/vendors/login", post(handlers::auth::vendor_login))
        .route("/distributors/login", post(handlers::auth::distributor_login))
        .route("/admin/login", post(handlers::auth::admin_login))
        .merge(
            Router::new()
                .route("/whoami", get(handlers::auth::whoami))
                .layer(guard()),
        );

    // Two-step flows are public; the session travels in `x-session-token`.
    let user_flow_routes = Router::new()
        .route(
            "/register",
            get(handlers::users::register_status).post(handlers::users::register),
        )
        .route(
            "/reset-password",
            get(handlers::users::reset_password_status).post(handlers::users::reset_password),
        );

    let user_routes = Router::new()
        .route("/me", get(handlers::users::get_me))
        .route(
            "/me/address",
            get(handlers::users::get_address).put(handlers::users::put_address),
        )
        .route(
            "/me/collections",
            get(handlers::users::list_collections).post(handlers::users::add_collection),
        )
        .route(
            "/me/collections/{item_id}",
            axum::routing::delete(handlers::users::remove_collection),
        )
        .layer(guard());

    let vendor_flow_routes = Router::new().route(
        "/register",
        get(handlers::vendors::register_status).post(handlers::vendors::register),
    );

    let vendor_routes = Router::new()
        .route("/me", get(handlers::vendors::get_profile))
        .route(
            "/me/items",
            get(handlers::items::list_own_items).post(handlers::items::create_item),
        )
        .route(
            "/me/items/{id}",
            axum::routing::delete(handlers::items::delete_item),
        )
        .route("/me/items/{id}/components", post(handlers::items::add_component))
        .route(
            "/me/distributors",
            get(handlers::vendors::list_distributors).post(handlers::vendors::create_distributor),
        )
        .route(
            "/me/distributors/{id}/address",
            put(handlers::vendors::update_distributor_address),
        )
        .route(
            "/me/distributors/{id}/revocations",
            post(handlers::vendors::request_revocation),
        )
        .layer(guard());

    let distributor_routes = Router::new()
        .route("/me", get(handlers::distributors::get_profile))
        .layer(guard());

    let admin_routes = Router::new()
        .route("/statistics", get(handlers::admin::get_statistics))
        .route("/vendors", get(handlers::admin::list_vendors))
        .route("/vendors/pending", get(handlers::admin::list_pending_vendors))
        .route("/vendors/{id}/confirm", post(handlers::admin::confirm_vendor))
        .route("/vendors/{id}/reject", post(handlers::admin::reject_vendor))
        .route("/distributors", get(handlers::admin::list_distributors))
        .route("/revocations", get(handlers::admin::list_revocations))
        .route("/revocations/{id}/approve", post(handlers::admin::approve_revocation))
        .route("/items", get(handlers::admin::list_items))
        .layer(guard());

    let area_routes = Router::new()
        .route("/", get(handlers::areas::list_provinces))
        .route("/{cn_id}", get(handlers::areas::get_area))
        .route("/{cn_id}/children", get(handlers::areas::list_children))
        .route("/{cn_id}/chain", get(handlers::areas::get_chain))
        .route("/{cn_id}/distributors", get(handlers::areas::city_distributors));

    let item_routes = Router::new()
        .route("/", get(handlers::items::list_items))
        .route("/{id}", get(handlers::items::get_item))
        .route("/choices/{attribute}", get(handlers::items::list_choices));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(docs::ApiDoc::openapi()) }))
        .route("/api/captcha", post(handlers::captcha::request_captcha))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_flow_routes.merge(user_routes))
        .nest("/api/vendors", vendor_flow_routes.merge(vendor_routes))
        .nest("/api/distributors", distributor_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/areas", area_routes)
        .nest("/api/items", item_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header::LOCATION},
        response::Response,
    };
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::middleware::session::SESSION_HEADER;

    fn app() -> Router {
        let settings = Settings {
            database_url: "postgres://localhost/unused".into(),
            jwt_secret: "secret".into(),
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 1,
            session_ttl: Duration::from_secs(60),
            captcha_ttl: Duration::from_secs(60),
            area_seed_path: None,
        };
        let pool = PgPoolOptions::new().connect_lazy(&settings.database_url).unwrap();
        router(AppState::from_parts(pool, &settings))
    }

    async fn send(app: &Router, method: Method, uri: &str, session: Option<&str>, body: &str) -> Response {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }
        app.clone()
            .oneshot(request.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap()
    }

    fn header<'a>(response: &'a Response, name: impl axum::http::header::AsHeaderName) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn skipping_to_step_two_redirects_and_keeps_the_session() {
        let app = app();
        let response = send(&app, Method::POST, "/api/users/register?step=2", Some("flow-1"), "{}").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header(&response, LOCATION), "/api/users/register?step=1");
        assert_eq!(header(&response, SESSION_HEADER), "flow-1");

        // The flow was opened at step 1, so asking for it now proceeds.
        let response = send(&app, Method::GET, "/api/users/register?step=1", Some("flow-1"), "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, SESSION_HEADER), "flow-1");
    }

    #[tokio::test]
    async fn an_invalid_first_step_leaves_the_flow_at_step_one() {
        let app = app();
        let body = r#"{"mobile":"123","captcha":"000000"}"#;
        let response = send(&app, Method::POST, "/api/users/reset-password", Some("flow-2"), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response, SESSION_HEADER), "flow-2");

        let response = send(&app, Method::POST, "/api/users/reset-password?step=2", Some("flow-2"), "{}").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header(&response, LOCATION), "/api/users/reset-password?step=1");
    }

    #[tokio::test]
    async fn unknown_steps_without_a_session_go_to_the_landing_page() {
        let app = app();
        let response = send(&app, Method::POST, "/api/vendors/register?step=3", None, "{}").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header(&response, LOCATION), "/");
        // A fresh token is minted and handed back.
        assert!(!header(&response, SESSION_HEADER).is_empty());
    }
}
