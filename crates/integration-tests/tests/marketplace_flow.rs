//! End-to-end marketplace scenario against a real database.
//!
//! `#[sqlx::test]` creates a fresh database per test from `DATABASE_URL` and
//! applies the API migrations.
//!
//! Run with: `cargo test -p souq-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use souq_api::services::auth::{Registration, create_account};
use souq_core::UserRole;
use souq_integration_tests::{TestApp, TestResponse, amount, request};

/// Register through the API and return `(token, user)`.
async fn register(app: &TestApp, client_ip: &str, email: &str, role: &str) -> (String, Value) {
    let resp = app
        .post_json_from(
            client_ip,
            "/auth/register",
            &json!({
                "email": email,
                "password": "souq-pass-123",
                "name": email.split('@').next().unwrap(),
                "role": role,
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let body = resp.json();
    (body["token"].as_str().unwrap().to_owned(), body["user"].clone())
}

async fn admin_token(app: &TestApp, pool: &PgPool) -> String {
    create_account(
        pool,
        &Registration {
            email: "admin@souq.test",
            password: "admin-pass-123",
            name: "Admin",
            phone: None,
            address: None,
            role: UserRole::Admin,
        },
    )
    .await
    .unwrap();

    let resp = app
        .post_json_from(
            "192.0.2.1",
            "/auth/login",
            &json!({"email": "admin@souq.test", "password": "admin-pass-123"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["user"]["role"], "admin");
    resp.json()["token"].as_str().unwrap().to_owned()
}

async fn patch(app: &TestApp, uri: &str, token: &str) -> TestResponse {
    app.send(request(Method::PATCH, uri, Some(token), None)).await
}

async fn send_json(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: &str,
    body: &Value,
) -> TestResponse {
    app.send(request(method, uri, Some(token), Some(body))).await
}

/// Open a store for `owner` and have the admin approve it. Returns the id.
async fn approved_store(app: &TestApp, admin: &str, owner: &str, name: &str) -> String {
    let resp = app
        .post_json("/stores", Some(owner), &json!({"store_name": name}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let store_id = resp.json()["id"].as_str().unwrap().to_owned();
    let resp = patch(app, &format!("/stores/{store_id}/approve?status=approved"), admin).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    store_id
}

async fn category(app: &TestApp, admin: &str, slug: &str) -> Value {
    let resp = app
        .post_json(
            "/categories",
            Some(admin),
            &json!({"name_ar": slug, "name_en": slug, "slug": slug}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    resp.json()["id"].clone()
}

/// List a product in the owner's first approved store. Returns the id.
async fn list_product(
    app: &TestApp,
    owner: &str,
    category_id: &Value,
    name: &str,
    price: &str,
) -> String {
    let resp = app
        .post_json(
            "/products",
            Some(owner),
            &json!({"category_id": category_id, "name": name, "price": price, "stock": 10}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    resp.json()["id"].as_str().unwrap().to_owned()
}

async fn add_to_cart(app: &TestApp, token: &str, product_id: &str, quantity: u32) -> TestResponse {
    app.post_json(
        "/cart/add",
        Some(token),
        &json!({"product_id": product_id, "quantity": quantity}),
    )
    .await
}

async fn checkout(app: &TestApp, token: &str) -> TestResponse {
    app.post_json(
        "/orders",
        Some(token),
        &json!({"shipping_address": "Bab Touma, Damascus", "phone": "0944000000"}),
    )
    .await
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_shopping_flow(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (seller, _) = register(&app, "192.0.2.2", "seller@souq.test", "store_owner").await;
    let (customer, customer_user) =
        register(&app, "192.0.2.3", "buyer@souq.test", "customer").await;

    // A pending store cannot list products.
    let resp = app
        .post_json(
            "/stores",
            Some(&seller),
            &json!({"store_name": "Damascus Threads", "description": "Linen"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let store = resp.json();
    assert_eq!(store["status"], "pending");
    let store_id = store["id"].as_str().unwrap().to_owned();

    let resp = app
        .post_json(
            "/categories",
            Some(&admin),
            &json!({
                "name_ar": "أزياء رجالية",
                "name_en": "Men's Fashion",
                "slug": " Mens-Fashion ",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let category = resp.json();
    assert_eq!(category["slug"], "mens-fashion");

    let product_body = json!({
        "category_id": category["id"],
        "name": "Linen Shirt",
        "price": "100.00",
        "stock": 5,
        "sizes": ["M", "L"],
    });
    let resp = app
        .post_json("/products", Some(&seller), &product_body)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = patch(
        &app,
        &format!("/stores/{store_id}/approve?status=approved"),
        &admin,
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["status"], "approved");

    let resp = app
        .post_json("/products", Some(&seller), &product_body)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let product = resp.json();
    let product_id = product["id"].as_str().unwrap().to_owned();
    assert_eq!(product["store_id"].as_str().unwrap(), store_id);

    // Listing and search.
    let resp = app.get("/products?search=linen", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json().as_array().unwrap().len(), 1);
    let resp = app.get("/products?max_price=50", None).await;
    assert!(resp.json().as_array().unwrap().is_empty());

    // Cart.
    let resp = app
        .post_json(
            "/cart/add",
            Some(&customer),
            &json!({"product_id": product_id, "quantity": 2}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["quantity"], 2);

    let cart = app.get("/cart", Some(&customer)).await.json();
    assert!((amount(&cart["total"]) - 200.0).abs() < f64::EPSILON);

    // Coupon.
    let resp = app
        .post_json(
            "/coupons",
            Some(&admin),
            &json!({"code": " save10 ", "discount_type": "percentage", "discount_value": "10"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["code"], "SAVE10");

    let resp = app
        .post_json(
            "/coupons/validate",
            Some(&customer),
            &json!({"code": "save10", "total": "200"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let priced = resp.json();
    assert!((amount(&priced["discount"]) - 20.0).abs() < f64::EPSILON);
    assert!((amount(&priced["final_total"]) - 180.0).abs() < f64::EPSILON);

    // Checkout.
    let resp = app
        .post_json(
            "/orders",
            Some(&customer),
            &json!({
                "shipping_address": "Old City, Damascus",
                "phone": "0999000000",
                "coupon_code": "save10",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let order = resp.json();
    let order_id = order["id"].as_str().unwrap().to_owned();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["coupon_code"], "SAVE10");
    assert_eq!(order["customer_id"], customer_user["id"]);
    assert!((amount(&order["total_amount"]) - 180.0).abs() < f64::EPSILON);

    // Stock is informational; checkout does not reserve it.
    let listing = app.get(&format!("/products/{product_id}"), None).await.json();
    assert_eq!(listing["stock"], 5);
    let cart = app.get("/cart", Some(&customer)).await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());

    let resp = app
        .post_json(
            "/orders",
            Some(&customer),
            &json!({"shipping_address": "Old City", "phone": "0999"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    // The supplier sees and advances the order.
    let store_orders = app.get("/orders/store", Some(&seller)).await.json();
    assert_eq!(store_orders.as_array().unwrap().len(), 1);
    let resp = patch(&app, &format!("/orders/{order_id}/status?status=shipped"), &seller).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let resp = patch(
        &app,
        &format!("/orders/{order_id}/status?status=delivered"),
        &customer,
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let mine = app.get("/orders/my", Some(&customer)).await.json();
    assert_eq!(mine[0]["status"], "shipped");

    // Reviews feed the listing aggregate.
    let resp = app
        .post_json(
            &format!("/products/{product_id}/reviews"),
            Some(&customer),
            &json!({"rating": 4, "comment": "Good fit"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let listing = app.get(&format!("/products/{product_id}"), None).await.json();
    assert_eq!(listing["review_count"], 1);
    assert!((listing["average_rating"].as_f64().unwrap() - 4.0).abs() < f64::EPSILON);

    // Wishlist.
    let resp = app
        .post_json(&format!("/wishlist/add/{product_id}"), Some(&customer), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let wishlist = app.get("/wishlist", Some(&customer)).await.json();
    assert_eq!(wishlist["products"].as_array().unwrap().len(), 1);

    // Deleting the store takes its products with it.
    let resp = app
        .send(request(
            Method::DELETE,
            &format!("/stores/{store_id}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["products_deleted"], 1);
    let resp = app.get(&format!("/products/{product_id}"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_password_reset_flow(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    let (_, _) = register(&app, "192.0.2.10", "forgetful@souq.test", "customer").await;

    // Unknown addresses get the same message and no code.
    let resp = app
        .post_json_from(
            "192.0.2.11",
            "/auth/forgot-password",
            &json!({"email": "nobody@souq.test"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json().get("code").is_none());

    // Without SMTP outside production the code is returned.
    let resp = app
        .post_json_from(
            "192.0.2.11",
            "/auth/forgot-password",
            &json!({"email": "forgetful@souq.test"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let code = resp.json()["code"].as_str().unwrap().to_owned();
    assert_eq!(code.len(), 4);

    let reset = json!({
        "email": "forgetful@souq.test",
        "code": code,
        "new_password": "brand-new-pass",
    });
    let resp = app
        .post_json_from("192.0.2.12", "/auth/reset-password", &reset)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    // Codes are single use.
    let resp = app
        .post_json_from("192.0.2.12", "/auth/reset-password", &reset)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_json_from(
            "192.0.2.13",
            "/auth/login",
            &json!({"email": "forgetful@souq.test", "password": "souq-pass-123"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    let resp = app
        .post_json_from(
            "192.0.2.13",
            "/auth/login",
            &json!({"email": "forgetful@souq.test", "password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_duplicate_email_rejected(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    register(&app, "192.0.2.20", "twice@souq.test", "customer").await;

    let resp = app
        .post_json_from(
            "192.0.2.21",
            "/auth/register",
            &json!({"email": "TWICE@souq.test", "password": "souq-pass-123", "name": "Again"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.detail(), "Email already registered");
}

/// Owner opens a store, admin approves it, the owner lists one product, the
/// admin deletes the store: the product is gone from the store's listing.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_store_deletion_cascades_to_products(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (owner, _) = register(&app, "192.0.2.30", "owner@souq.test", "store_owner").await;

    let store = app
        .post_json("/stores", Some(&owner), &json!({"store_name": "Aleppo Soap"}))
        .await
        .json();
    assert_eq!(store["status"], "pending");
    let store_id = store["id"].as_str().unwrap().to_owned();

    // Approval is admin-only.
    let resp = patch(&app, &format!("/stores/{store_id}/approve?status=approved"), &owner).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let resp = patch(&app, &format!("/stores/{store_id}/approve?status=approved"), &admin).await;
    assert_eq!(resp.status, StatusCode::OK);

    let category = app
        .post_json(
            "/categories",
            Some(&admin),
            &json!({
                "name_ar": "أدوات منزلية",
                "name_en": "Home & Kitchen",
                "slug": "home-kitchen",
            }),
        )
        .await
        .json();
    let resp = app
        .post_json(
            "/products",
            Some(&owner),
            &json!({
                "store_id": store_id,
                "category_id": category["id"],
                "name": "Laurel Soap",
                "price": 50000,
                "stock": 10,
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let listing = app.get(&format!("/products?store_id={store_id}"), None).await.json();
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let resp = app
        .send(request(
            Method::DELETE,
            &format!("/stores/{store_id}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["products_deleted"], 1);

    let listing = app.get(&format!("/products?store_id={store_id}"), None).await.json();
    assert_eq!(listing, json!([]));
    let resp = app.get(&format!("/stores/{store_id}"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

/// A coupon capped at one use is redeemed by the first order only, and a
/// rejected coupon leaves the cart untouched.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_coupon_usage_cap_enforced_at_checkout(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (customer, _) = register(&app, "192.0.2.40", "coupon@souq.test", "customer").await;

    // The admin can sell too, which keeps this test to one extra account.
    app.post_json("/stores", Some(&admin), &json!({"store_name": "House Store"}))
        .await;
    let store = app.get("/stores/my", Some(&admin)).await.json()[0].clone();
    let store_id = store["id"].as_str().unwrap().to_owned();
    patch(&app, &format!("/stores/{store_id}/approve?status=approved"), &admin).await;
    let category = app
        .post_json(
            "/categories",
            Some(&admin),
            &json!({"name_ar": "إلكترونيات", "name_en": "Electronics", "slug": "electronics"}),
        )
        .await
        .json();
    let product = app
        .post_json(
            "/products",
            Some(&admin),
            &json!({"category_id": category["id"], "name": "Cable", "price": "30", "stock": 10}),
        )
        .await
        .json();

    app.post_json(
        "/coupons",
        Some(&admin),
        &json!({
            "code": "ONCE",
            "discount_type": "fixed",
            "discount_value": "50",
            "max_uses": 1,
        }),
    )
    .await;

    let order_body = json!({"shipping_address": "Homs", "phone": "0933", "coupon_code": "once"});
    let add = json!({"product_id": product["id"], "quantity": 1});

    app.post_json("/cart/add", Some(&customer), &add).await;
    let resp = app.post_json("/orders", Some(&customer), &order_body).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    // Discount larger than the subtotal clamps the total at zero.
    assert!(amount(&resp.json()["total_amount"]).abs() < f64::EPSILON);
    assert!((amount(&resp.json()["discount"]) - 30.0).abs() < f64::EPSILON);

    app.post_json("/cart/add", Some(&customer), &add).await;
    let resp = app.post_json("/orders", Some(&customer), &order_body).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.detail(), "Coupon usage limit reached");

    let cart = app.get("/cart", Some(&customer)).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    let orders = app.get("/orders/my", Some(&customer)).await.json();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

/// Checkout charges the price on the product at the moment of ordering, not
/// the price seen when the line was added, and snapshots it into the order.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_checkout_uses_live_price(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (seller, _) = register(&app, "192.0.2.50", "potter@souq.test", "store_owner").await;
    let (customer, _) = register(&app, "192.0.2.51", "collector@souq.test", "customer").await;

    approved_store(&app, &admin, &seller, "Hama Pottery").await;
    let category_id = category(&app, &admin, "ceramics").await;
    let product_id = list_product(&app, &seller, &category_id, "Blue Jug", "100").await;

    let resp = add_to_cart(&app, &customer, &product_id, 2).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let resp = send_json(
        &app,
        Method::PUT,
        &format!("/products/{product_id}"),
        &seller,
        &json!({
            "category_id": category_id,
            "name": "Blue Jug",
            "price": "120.50",
            "stock": 10,
        }),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let cart = app.get("/cart", Some(&customer)).await.json();
    assert!((amount(&cart["total"]) - 241.0).abs() < f64::EPSILON);

    let resp = checkout(&app, &customer).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let order = resp.json();
    assert!((amount(&order["original_total"]) - 241.0).abs() < f64::EPSILON);
    assert!((amount(&order["total_amount"]) - 241.0).abs() < f64::EPSILON);
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!((amount(&items[0]["price"]) - 120.5).abs() < f64::EPSILON);
    assert_eq!(items[0]["quantity"], 2);

    // Later price changes do not touch the placed order.
    send_json(
        &app,
        Method::PATCH,
        &format!("/products/{product_id}"),
        &seller,
        &json!({"price": "80"}),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();
    let stored = app.get(&format!("/orders/{order_id}"), Some(&customer)).await.json();
    assert!((amount(&stored["items"][0]["price"]) - 120.5).abs() < f64::EPSILON);
}

/// A product deactivated after it was added to the cart is left out of the
/// order and its line is cleared with the rest of the cart.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_checkout_skips_deactivated_products(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (seller, _) = register(&app, "192.0.2.60", "spice@souq.test", "store_owner").await;
    let (customer, _) = register(&app, "192.0.2.61", "cook@souq.test", "customer").await;

    approved_store(&app, &admin, &seller, "Spice Bazaar").await;
    let category_id = category(&app, &admin, "spices").await;
    let kept = list_product(&app, &seller, &category_id, "Za'atar", "15").await;
    let dropped = list_product(&app, &seller, &category_id, "Saffron", "90").await;

    add_to_cart(&app, &customer, &kept, 1).await;
    add_to_cart(&app, &customer, &dropped, 1).await;

    let resp = send_json(
        &app,
        Method::PATCH,
        &format!("/products/{dropped}"),
        &seller,
        &json!({"status": "inactive"}),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let resp = checkout(&app, &customer).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let order = resp.json();
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"].as_str().unwrap(), kept);
    assert!((amount(&order["total_amount"]) - 15.0).abs() < f64::EPSILON);

    let cart = app.get("/cart", Some(&customer)).await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());

    // With only inactive lines left there is nothing to order.
    let resp = send_json(
        &app,
        Method::PATCH,
        &format!("/products/{dropped}"),
        &seller,
        &json!({"status": "active"}),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    add_to_cart(&app, &customer, &dropped, 1).await;
    send_json(
        &app,
        Method::PATCH,
        &format!("/products/{dropped}"),
        &seller,
        &json!({"status": "inactive"}),
    )
    .await;
    let resp = checkout(&app, &customer).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.detail(), "Cart is empty");
}

/// Rejecting a store hides its catalog from shoppers and blocks purchases.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_rejected_store_products_hidden(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (seller, _) = register(&app, "192.0.2.70", "vendor@souq.test", "store_owner").await;
    let (customer, _) = register(&app, "192.0.2.71", "shopper@souq.test", "customer").await;

    let store_id = approved_store(&app, &admin, &seller, "Latakia Olives").await;
    let category_id = category(&app, &admin, "groceries").await;
    let product_id = list_product(&app, &seller, &category_id, "Olive Oil", "40").await;
    let other_id = list_product(&app, &seller, &category_id, "Olive Soap", "12").await;

    let listing = app.get(&format!("/products?store_id={store_id}"), None).await.json();
    assert_eq!(listing.as_array().unwrap().len(), 2);
    add_to_cart(&app, &customer, &product_id, 1).await;

    let resp = patch(&app, &format!("/stores/{store_id}/approve?status=rejected"), &admin).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let listing = app.get("/products", None).await.json();
    assert_eq!(listing, json!([]));
    let similar = app.get(&format!("/products/{other_id}/similar"), None).await.json();
    assert_eq!(similar, json!([]));

    let resp = add_to_cart(&app, &customer, &other_id, 1).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = checkout(&app, &customer).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.detail(), "Cart is empty");

    // The owner can still load the product to manage it.
    let resp = app.get(&format!("/products/{product_id}"), Some(&seller)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

/// Totals that would not fit the money columns are refused with a 400 and
/// nothing is written.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_order_total_overflow_rejected(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (customer, _) = register(&app, "192.0.2.80", "whale@souq.test", "customer").await;

    approved_store(&app, &admin, &admin, "Gold Souq").await;
    let category_id = category(&app, &admin, "jewellery").await;
    let product_id = list_product(&app, &admin, &category_id, "Gold Bar", "9000000000").await;

    let resp = add_to_cart(&app, &customer, &product_id, 2).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let resp = checkout(&app, &customer).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{}", resp.text());
    assert_eq!(resp.detail(), "Order total cannot exceed 9999999999.99");

    let cart = app.get("/cart", Some(&customer)).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    let orders = app.get("/orders/my", Some(&customer)).await.json();
    assert_eq!(orders, json!([]));
}

/// A buyer files a complaint about their order; an admin triages and answers
/// it; the buyer sees the answer.
#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_complaint_flow(pool: PgPool) {
    let app = TestApp::with_pool(pool.clone());
    let admin = admin_token(&app, &pool).await;
    let (customer, customer_user) =
        register(&app, "192.0.2.90", "unhappy@souq.test", "customer").await;
    let (stranger, _) = register(&app, "192.0.2.91", "nosy@souq.test", "customer").await;

    approved_store(&app, &admin, &admin, "House Store").await;
    let category_id = category(&app, &admin, "textiles").await;
    let product_id = list_product(&app, &admin, &category_id, "Brocade Scarf", "35").await;
    add_to_cart(&app, &customer, &product_id, 1).await;
    let order = checkout(&app, &customer).await.json();
    let order_id = order["id"].as_str().unwrap().to_owned();

    let body = json!({
        "subject": "Torn scarf",
        "message": "The scarf arrived with a tear along the hem.",
        "order_id": order_id,
        "images": ["https://cdn.example.com/uploads/tear.png"],
    });

    // Another customer's order cannot be referenced.
    let resp = app.post_json("/complaints", Some(&stranger), &body).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.post_json("/complaints", Some(&customer), &body).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    let complaint = resp.json();
    assert_eq!(complaint["status"], "pending");
    assert_eq!(complaint["user_id"], customer_user["id"]);
    assert_eq!(complaint["order_id"].as_str().unwrap(), order_id);
    assert!(complaint["admin_response"].is_null());
    let complaint_id = complaint["id"].as_str().unwrap().to_owned();

    let mine = app.get("/complaints", Some(&stranger)).await.json();
    assert_eq!(mine, json!([]));

    let pending = app.get("/complaints/all?status=pending", Some(&admin)).await.json();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["user_name"], "unhappy");

    let resp = send_json(
        &app,
        Method::PATCH,
        &format!("/complaints/{complaint_id}"),
        &admin,
        &json!({"status": "in_progress", "admin_response": "A replacement is on its way."}),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    assert_eq!(resp.json()["status"], "in_progress");

    // Status alone keeps the earlier response.
    let resp = send_json(
        &app,
        Method::PATCH,
        &format!("/complaints/{complaint_id}"),
        &admin,
        &json!({"status": "resolved"}),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());

    let mine = app.get("/complaints", Some(&customer)).await.json();
    assert_eq!(mine[0]["status"], "resolved");
    assert_eq!(mine[0]["admin_response"], "A replacement is on its way.");
    let pending = app.get("/complaints/all?status=pending", Some(&admin)).await.json();
    assert_eq!(pending, json!([]));

    let missing = souq_core::ComplaintId::new();
    let resp = send_json(
        &app,
        Method::PATCH,
        &format!("/complaints/{missing}"),
        &admin,
        &json!({"status": "closed"}),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
