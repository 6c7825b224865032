// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{application, auth, health, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, applications, quiz).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, AI generator).
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

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let application_routes = Router::new()
        .route("/", post(application::create_application))
        .route("/{id}", get(application::get_application))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        // Submission works anonymously; a valid token attaches identity.
        .merge(
            Router::new()
                .route("/submit", post(quiz::submit_quiz))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    optional_auth_middleware,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/start-for-application",
                    post(quiz::start_quiz_for_application),
                )
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Double middleware protection: Auth first, then Admin check
        .merge(
            Router::new()
                .route("/results", get(quiz::list_results))
                .route(
                    "/results/{application_id}",
                    get(quiz::get_result_by_application),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/applications", application_routes)
        .nest("/api/quiz", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
