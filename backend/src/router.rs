//! HTTP router setup.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{auth, creator, nft, post, trade, user};

/// Create the application router.
pub fn create(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users/me", put(user::update_me))
        .route("/creators", post(creator::create_creator))
        .route("/creators/:id", put(creator::update_creator))
        .route("/posts", post(post::create_post))
        .route("/posts/:id", put(post::update_post))
        .route("/posts/:id/unlock", post(post::unlock_post))
        .route("/nfts", post(nft::create_nft))
        .route("/nfts/metadata", post(nft::upload_metadata))
        .route("/nfts/recalculate-prices", post(nft::recalculate_prices))
        .route("/trades", post(trade::create_trade))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/", get(|| async { "Hello, FanPit!" }))
        .route("/auth/login", post(user::login))
        .route("/users", post(user::create_user))
        .route("/users/:wallet", get(user::find_user))
        .route("/creators", get(creator::list_creators))
        .route("/creators/:id", get(creator::get_creator))
        .route("/creators/:id/posts", get(post::list_creator_posts))
        .route("/creators/wallet/:wallet", get(creator::find_creator_by_wallet))
        .route("/posts/:id", get(post::get_post))
        .route("/nfts", get(nft::list_nfts))
        .route("/nfts/:id", get(nft::get_nft))
        .route("/nfts/:id/view", post(nft::record_view))
        .route("/nfts/:id/like", post(nft::record_like))
        .route("/nfts/:id/engagement", get(nft::get_engagement))
        .route("/nfts/:id/trades", get(trade::list_nft_trades))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
