use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use solana_sdk::signature::{Keypair, Signer};
use tower::ServiceExt;
use uuid::Uuid;

use fanpit::auth::create_token;
use fanpit::store::{MemoryStore, Store};
use fanpit::{create_router, AppConfig, AppState};

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(AppConfig::local(SECRET))
    }

    fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());
        Self {
            router: create_router(state),
            store,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Registers a creator profile for a fresh wallet, returning (wallet, token, creator id).
    async fn creator(&self, gating_enabled: bool) -> (String, String, String) {
        let (wallet, token) = account();
        let (status, body) = self
            .send(
                Method::POST,
                "/creators",
                Some(&token),
                Some(json!({
                    "name": "Ada",
                    "description": "sketches and studies",
                    "gating_enabled": gating_enabled
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["id"].as_str().unwrap().to_string();
        (wallet, token, id)
    }

    async fn nft(&self, token: &str, price: f64) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/nfts",
                Some(token),
                Some(json!({ "title": "Study #1", "image_url": "ipfs://study", "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

fn account() -> (String, String) {
    let wallet = Keypair::new().pubkey().to_string();
    let token = create_token(&wallet, SECRET).unwrap();
    (wallet, token)
}

#[tokio::test]
async fn login_with_wallet_signature_issues_usable_token() {
    let app = TestApp::new();
    let keypair = Keypair::new();
    let wallet = keypair.pubkey().to_string();
    let message = "Sign in to FanPit: nonce 42";
    let signature = keypair.sign_message(message.as_bytes()).to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "wallet_address": wallet, "message": message, "signature": signature })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["wallet_address"], wallet.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::PUT,
            "/users/me",
            Some(&token),
            Some(json!({ "username": "ada" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["username"], "ada");

    let (status, body) = app
        .send(Method::GET, &format!("/users/{wallet}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
}

#[tokio::test]
async fn login_with_tampered_message_is_rejected() {
    let app = TestApp::new();
    let keypair = Keypair::new();
    let signature = keypair.sign_message(b"Sign in to FanPit").to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "wallet_address": keypair.pubkey().to_string(),
                "message": "Sign in to FanPit as admin",
                "signature": signature
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_user_rejects_duplicates_and_bad_wallets() {
    let app = TestApp::new();
    let (wallet, _) = account();

    let (status, _) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "wallet_address": wallet, "username": "first" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "wallet_address": wallet })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({ "wallet_address": "definitely not a wallet" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, "/nfts/recalculate-prices", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing Authorization header");

    let (status, _) = app
        .send(
            Method::POST,
            "/creators",
            Some("not-a-jwt"),
            Some(json!({ "name": "Eve" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn one_creator_profile_per_wallet() {
    let app = TestApp::new();
    let (wallet, token, creator_id) = app.creator(false).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/creators",
            Some(&token),
            Some(json!({ "name": "Ada again" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(Method::GET, &format!("/creators/wallet/{wallet}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], creator_id.as_str());
}

#[tokio::test]
async fn only_the_owner_updates_a_creator() {
    let app = TestApp::new();
    let (_, token, creator_id) = app.creator(false).await;
    let (_, stranger) = account();
    let uri = format!("/creators/{creator_id}");

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&stranger),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "gating_enabled": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gating_enabled"], true);
    assert_eq!(body["name"], "Ada");
}

#[tokio::test]
async fn ungated_post_price_is_forced_to_zero() {
    let app = TestApp::new();
    let (_, token, _) = app.creator(true).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/posts",
            Some(&token),
            Some(json!({ "status_text": "free preview", "is_gated": false, "price": 9.99 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price"], 0.0);
    assert_eq!(body["locked"], false);
}

#[tokio::test]
async fn posting_requires_a_creator_profile_with_gating_for_gated_posts() {
    let app = TestApp::new();
    let (_, fan) = account();
    let (status, _) = app
        .send(
            Method::POST,
            "/posts",
            Some(&fan),
            Some(json!({ "status_text": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, token, _) = app.creator(false).await;
    let (status, _) = app
        .send(
            Method::POST,
            "/posts",
            Some(&token),
            Some(json!({ "status_text": "paid", "is_gated": true, "price": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/posts",
            Some(&token),
            Some(json!({ "status_text": "negative", "price": -1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gated_post_unlocks_for_paying_wallet_only() {
    let app = TestApp::new();
    let (_, owner_token, creator_id) = app.creator(true).await;
    let (status, body) = app
        .send(
            Method::POST,
            "/posts",
            Some(&owner_token),
            Some(json!({
                "status_text": "full-resolution scans",
                "image_url": "ipfs://scan",
                "is_gated": true,
                "price": 2.0
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["id"].as_str().unwrap().to_string();
    let post_uri = format!("/posts/{post_id}");

    let (fan_wallet, fan) = account();
    let (_, other) = account();

    // Empty access list: locked for everyone but the owner.
    let (_, body) = app.send(Method::GET, &post_uri, Some(&fan), None).await;
    assert_eq!(body["locked"], true);
    assert_eq!(body["status_text"], Value::Null);
    assert_eq!(body["price"], 2.0);
    let (_, body) = app.send(Method::GET, &post_uri, None, None).await;
    assert_eq!(body["locked"], true);
    let (_, body) = app.send(Method::GET, &post_uri, Some(&owner_token), None).await;
    assert_eq!(body["locked"], false);
    assert_eq!(body["status_text"], "full-resolution scans");

    let unlock_uri = format!("{post_uri}/unlock");
    for _ in 0..2 {
        let (status, body) = app
            .send(Method::POST, &unlock_uri, Some(&fan), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["locked"], false);
        assert_eq!(body["image_url"], "ipfs://scan");
    }

    let stored = app
        .store
        .find_post(Uuid::parse_str(&post_id).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.accessible_by, vec![fan_wallet]);

    let (_, feed) = app
        .send(
            Method::GET,
            &format!("/creators/{creator_id}/posts"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(feed[0]["locked"], true);
    let (_, feed) = app
        .send(
            Method::GET,
            &format!("/creators/{creator_id}/posts"),
            Some(&fan),
            None,
        )
        .await;
    assert_eq!(feed[0]["locked"], false);
}

#[tokio::test]
async fn updating_a_post_reapplies_price_rule_and_checks_owner() {
    let app = TestApp::new();
    let (_, owner, _) = app.creator(true).await;
    let (_, body) = app
        .send(
            Method::POST,
            "/posts",
            Some(&owner),
            Some(json!({ "status_text": "early access", "is_gated": true, "price": 3.0 })),
        )
        .await;
    let uri = format!("/posts/{}", body["id"].as_str().unwrap());

    let (_, stranger) = account();
    let (status, _) = app
        .send(Method::PUT, &uri, Some(&stranger), Some(json!({ "price": 0.1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&owner), Some(json!({ "is_gated": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_gated"], false);
    assert_eq!(body["price"], 0.0);
    assert_eq!(body["status_text"], "early access");
}

#[tokio::test]
async fn unlock_with_payment_verification_requires_signature() {
    let mut config = AppConfig::local(SECRET);
    config.verify_payments = true;
    let app = TestApp::with_config(config);

    let (_, owner, _) = app.creator(true).await;
    let (_, body) = app
        .send(
            Method::POST,
            "/posts",
            Some(&owner),
            Some(json!({ "status_text": "members", "is_gated": true, "price": 1.0 })),
        )
        .await;
    let unlock_uri = format!("/posts/{}/unlock", body["id"].as_str().unwrap());

    let (_, fan) = account();
    let (status, _) = app
        .send(Method::POST, &unlock_uri, Some(&fan), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (status, _) = app
        .send(
            Method::POST,
            &unlock_uri,
            Some(&fan),
            Some(json!({ "tx_signature": "not-a-signature" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The owner never pays.
    let (status, body) = app
        .send(Method::POST, &unlock_uri, Some(&owner), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locked"], false);
}

#[tokio::test]
async fn trade_moves_price_and_extends_history() {
    let app = TestApp::new();
    let (seller, token, _) = app.creator(false).await;
    let nft_id = app.nft(&token, 1.0).await;
    let (_, buyer) = account();

    let (status, body) = app
        .send(
            Method::POST,
            "/trades",
            Some(&buyer),
            Some(json!({ "nft_id": nft_id, "seller_id": seller, "price": 5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, nft) = app
        .send(Method::GET, &format!("/nfts/{nft_id}"), None, None)
        .await;
    assert_eq!(nft["current_price"], 5.0);
    assert_eq!(nft["price_history"], json!([1.0, 5.0]));

    let (_, trades) = app
        .send(Method::GET, &format!("/nfts/{nft_id}/trades"), None, None)
        .await;
    assert_eq!(trades.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn trade_for_unknown_nft_is_not_recorded() {
    let app = TestApp::new();
    let (_, buyer) = account();
    let missing = Uuid::new_v4();

    let (status, _) = app
        .send(
            Method::POST,
            "/trades",
            Some(&buyer),
            Some(json!({ "nft_id": missing, "seller_id": "someone", "price": 5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count_trades(missing).unwrap(), 0);
}

#[tokio::test]
async fn engagement_feeds_price_recalculation() {
    let app = TestApp::new();
    let (seller, token, _) = app.creator(false).await;
    let nft_id = app.nft(&token, 1.0).await;

    let (status, body) = app
        .send(Method::GET, &format!("/nfts/{nft_id}/engagement"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!((body["views"].as_i64(), body["likes"].as_i64()), (Some(0), Some(0)));

    for _ in 0..10 {
        app.send(Method::POST, &format!("/nfts/{nft_id}/view"), None, None)
            .await;
    }
    let mut likes = Value::Null;
    for _ in 0..2 {
        let (status, body) = app
            .send(Method::POST, &format!("/nfts/{nft_id}/like"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        likes = body["likes"].clone();
    }
    assert_eq!(likes, 2);

    let (_, buyer) = account();
    app.send(
        Method::POST,
        "/trades",
        Some(&buyer),
        Some(json!({ "nft_id": nft_id, "seller_id": seller, "price": 1.0 })),
    )
    .await;

    let (status, updates) = app
        .send(Method::POST, "/nfts/recalculate-prices", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{updates}");
    assert_eq!(updates[0]["previous_price"], 1.0);
    assert_eq!(updates[0]["new_price"], 1.33);

    let (_, nft) = app
        .send(Method::GET, &format!("/nfts/{nft_id}"), None, None)
        .await;
    assert_eq!(nft["current_price"], 1.33);
    assert_eq!(nft["price_history"], json!([1.0, 1.0, 1.33]));
}

#[tokio::test]
async fn engagement_on_unknown_nft_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/nfts/{}/like", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metadata_upload_without_ipfs_is_unavailable() {
    let app = TestApp::new();
    let (_, token) = account();
    let (status, _) = app
        .send(
            Method::POST,
            "/nfts/metadata",
            Some(&token),
            Some(json!({
                "name": "Study",
                "description": "charcoal",
                "file_name": "study.png",
                "image_base64": "iVBORw0KGgo="
            })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn sub_cent_prices_never_drop_on_recalculation() {
    let app = TestApp::new();
    let (_, token, _) = app.creator(false).await;
    let nft_id = app.nft(&token, 1.004).await;

    let (status, updates) = app
        .send(Method::POST, "/nfts/recalculate-prices", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updates[0]["previous_price"], 1.0);
    assert_eq!(updates[0]["new_price"], 1.0);

    let (_, nft) = app
        .send(Method::GET, &format!("/nfts/{nft_id}"), None, None)
        .await;
    assert_eq!(nft["price_history"], json!([1.0, 1.0]));
}
