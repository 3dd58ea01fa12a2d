// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{comment, moderation},
    state::AppState,
    utils::jwt::{auth_middleware, moderator_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Comment writes require a caller identity; thread listings serve
///   anonymous readers too.
/// * Moderation endpoints sit behind the capability check.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route(
            "/{id}",
            put(comment::update_comment).delete(comment::delete_comment),
        )
        .route("/{id}/reactions", post(comment::react))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // `/api/posts/{id}/comments`, `/api/files/{id}/comments`, ...
    let listing_routes = Router::new()
        .route("/{kind}/{id}/comments", get(comment::list_comments))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let moderation_routes = Router::new()
        .route("/comments/{id}/approve", post(moderation::approve_comment))
        .route("/comments/{id}/reject", post(moderation::reject_comment))
        .route(
            "/comments/{id}/reinstate",
            post(moderation::reinstate_comment),
        )
        .route("/comments/{id}/remove", post(moderation::remove_comment))
        // Double middleware protection: Auth first, then capability check
        .layer(middleware::from_fn(moderator_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/comments", comment_routes)
        .nest("/api/moderation", moderation_routes)
        .nest("/api", listing_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
