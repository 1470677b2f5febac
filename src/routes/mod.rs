use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod extract;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod saved;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", users::router())
        .nest("/addresses", addresses::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/checkout", orders::checkout_router())
        .nest("/orders", orders::router())
        .nest("/favorites", saved::favorites_router())
        .nest("/wishlist", saved::wishlist_router())
        .nest("/admin", admin::router())
}
