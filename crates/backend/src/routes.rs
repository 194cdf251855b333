use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::shared::app_state::AppState;
use crate::system::{self, auth};

/// Системные роуты: здоровье, аутентификация, профиль
fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/register",
            post(system::handlers::auth::register),
        )
        .route("/api/system/auth/login", post(system::handlers::auth::login))
        // ========================================
        // CURRENT USER (protected)
        // ========================================
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_user)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        .route(
            "/api/system/users/me/courses",
            get(system::handlers::users::purchased_courses)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .merge(system_routes())
        // ========================================
        // A001 CATEGORIES
        // ========================================
        .route(
            "/api/categories/main",
            get(handlers::a001_category::list_main),
        )
        .route(
            "/api/categories/:id/children",
            get(handlers::a001_category::list_children),
        )
        .route(
            "/api/categories",
            post(handlers::a001_category::create)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/categories/:id",
            axum::routing::put(handlers::a001_category::update)
                .delete(handlers::a001_category::delete)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        // ========================================
        // A002 COURSES
        // ========================================
        // GET is public, mutations resolve the user via CurrentUser
        .route(
            "/api/courses",
            get(handlers::a002_course::list_all).post(handlers::a002_course::create),
        )
        .route(
            "/api/courses/:id",
            get(handlers::a002_course::get_by_id)
                .put(handlers::a002_course::update)
                .delete(handlers::a002_course::delete),
        )
        .route(
            "/api/courses/:id/comments",
            post(handlers::a002_course::add_comment)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        .route(
            "/api/courses/:id/comments/:comment_id",
            axum::routing::delete(handlers::a002_course::remove_comment)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        .route(
            "/api/courses/:id/purchase",
            post(handlers::a002_course::purchase)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        .with_state(state)
}
