use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod model;
pub mod password;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/", get(handlers::list_users))
        .route("/me", get(handlers::get_me).patch(handlers::update_me))
        .route("/:id", get(handlers::get_user))
}
