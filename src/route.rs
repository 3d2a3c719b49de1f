use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handler::{
        delete_note_handler, get_note_handler, get_notes_handler, get_tags_handler,
        health_checker_handler, login_user_handler, logout_handler, post_note_handler,
        put_note_handler, refresh_token_handler, register_user_handler,
    },
    jwt_auth::auth,
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/notes", get(get_notes_handler).post(post_note_handler))
        .route(
            "/notes/:id",
            get(get_note_handler)
                .put(put_note_handler)
                .delete(delete_note_handler),
        )
        .route("/tags", get(get_tags_handler))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth));

    Router::new()
        .route("/health", get(health_checker_handler))
        .route("/auth/register", post(register_user_handler))
        .route("/auth/login", post(login_user_handler))
        .route("/auth/refresh", post(refresh_token_handler))
        .route("/auth/logout", post(logout_handler))
        .merge(protected)
        .with_state(app_state)
}
