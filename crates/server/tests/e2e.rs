use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::auth::ServerState;
use server::routes;
use service::auth::AuthConfig;

const ADMIN_EMAIL: &str = "root@fixit.test";
const ADMIN_PASSWORD: &str = "root-pass";

struct TestApp {
    base_url: String,
    http: Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, value))
    }

    async fn get(&self, path: &str, token: Option<&str>) -> anyhow::Result<(StatusCode, Value)> {
        self.call(reqwest::Method::GET, path, token, None).await
    }

    async fn session(&self, path: &str, body: Value) -> anyhow::Result<(String, String)> {
        let (status, v) = self.call(reqwest::Method::POST, path, None, Some(body)).await?;
        anyhow::ensure!(status == StatusCode::OK, "{path}: {status} {v}");
        Ok((
            v["token"].as_str().unwrap_or_default().to_string(),
            v["userId"].as_str().unwrap_or_default().to_string(),
        ))
    }

    async fn register(&self, name: &str, email: &str, role: &str) -> anyhow::Result<String> {
        let body = json!({ "name": name, "email": email, "password": "secret1", "role": role });
        Ok(self.session("/api/auth/register", body).await?.0)
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let db = models::db::connect_ephemeral().await?;
    let cfg = AuthConfig { jwt_secret: Some("e2e-secret".into()), token_ttl_secs: 600 };
    let state = ServerState::new(db, cfg);
    state.auth.ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let app = routes::build_router(state, CorsLayer::very_permissive());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {e}");
        }
    });

    Ok(TestApp {
        base_url: format!("http://{}:{}", addr.ip(), addr.port()),
        http: Client::builder().cookie_store(true).build()?,
    })
}

#[tokio::test]
async fn cookie_session_authenticates_follow_up_requests() -> anyhow::Result<()> {
    let app = start_server().await?;
    app.register("Cookie", "cookie@example.com", "user").await?;

    let (status, me) = app.get("/api/profile/me", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "cookie@example.com");

    let (status, _) = app.call(reqwest::Method::POST, "/api/auth/logout", None, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/profile/me", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn booking_review_and_removal_lifecycle() -> anyhow::Result<()> {
    use reqwest::Method;

    let app = start_server().await?;
    let alice = app.register("Alice", "alice@example.com", "user").await?;
    let bob = app.register("Bob", "bob@example.com", "technician").await?;
    let carl = app.register("Carl", "carl@example.com", "user").await?;
    let (admin, admin_id) = app
        .session("/api/auth/login", json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await?;

    // Bob fills in his profile; it stays hidden until verified.
    let profile = json!({
        "servicesOffered": ["Plumbing", "Other"],
        "contactNumber": "01234567890",
        "location": "Downtown Springfield",
        "serviceAreas": "Springfield, Shelbyville",
        "availability": "Monday, Tuesday",
    });
    let (status, saved) =
        app.call(Method::POST, "/api/profile/technician", Some(&bob), Some(profile)).await?;
    assert_eq!(status, StatusCode::OK);
    let tech_id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(app.get("/api/technicians", None).await?.1, json!([]));

    let verify_path = format!("/api/admin/technicians/{tech_id}/verify");
    let (status, _) = app.call(Method::PUT, &verify_path, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::PUT, &verify_path, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = app.get("/api/technicians", None).await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["user"]["name"], "Bob");
    let search = "/api/technicians/search?service=plumb&serviceArea=shelby";
    let (_, found) = app.get(search, None).await?;
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    let (status, found) = app.get("/api/technicians/search?location=paris", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([]));

    // 2024-06-03 is a Monday; 2024-06-05 a Wednesday.
    let booking = json!({
        "technicianId": tech_id,
        "service": "Plumbing",
        "bookingDate": "2024-06-03",
        "bookingTime": "10:00",
        "totalPrice": 40.0,
    });
    let (status, created) =
        app.call(Method::POST, "/api/bookings", Some(&alice), Some(booking.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let booking_id = created["id"].as_str().unwrap().to_string();

    let mut wednesday = booking.clone();
    wednesday["bookingDate"] = json!("2024-06-05");
    let (status, _) = app.call(Method::POST, "/api/bookings", Some(&carl), Some(booking)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.call(Method::POST, "/api/bookings", Some(&carl), Some(wednesday)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, bobs) = app.get("/api/bookings/me", Some(&bob)).await?;
    assert_eq!(bobs[0]["user"]["name"], "Alice");
    let (_, alices) = app.get("/api/bookings/me", Some(&alice)).await?;
    assert_eq!(alices[0]["technician"]["contactNumber"], "01234567890");

    // No review before the job is done.
    let review = json!({ "technicianId": tech_id, "rating": 5, "comment": "Quick and tidy" });
    let (status, _) =
        app.call(Method::POST, "/api/reviews", Some(&alice), Some(review.clone())).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let status_path = format!("/api/bookings/{booking_id}/status");
    let done = json!({ "status": "done" });
    let (status, _) = app.call(Method::PUT, &status_path, Some(&bob), Some(done)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let completed = json!({ "status": "completed" });
    let (status, updated) = app.call(Method::PUT, &status_path, Some(&bob), Some(completed)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");

    let (status, _) =
        app.call(Method::POST, "/api/reviews", Some(&alice), Some(review.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.call(Method::POST, "/api/reviews", Some(&alice), Some(review)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let out_of_range = json!({ "technicianId": tech_id, "rating": 6 });
    let (status, _) =
        app.call(Method::POST, "/api/reviews", Some(&carl), Some(out_of_range)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tech) = app.get(&format!("/api/technicians/{tech_id}"), None).await?;
    assert_eq!(tech["averageRating"].as_f64(), Some(5.0));
    assert_eq!(tech["reviewCount"], 1);
    let (_, reviews) = app.get(&format!("/api/reviews/{tech_id}"), None).await?;
    assert_eq!(reviews[0]["user"]["name"], "Alice");

    // Removing the profile takes its bookings, reviews and owner with it.
    let tech_path = format!("/api/admin/technicians/{tech_id}");
    let (status, removed) = app.call(Method::DELETE, &tech_path, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["report"]["userRemoved"], true);
    assert_eq!(removed["report"]["bookingsRemoved"], 1);
    assert_eq!(removed["report"]["reviewsRemoved"], 1);

    let (status, _) = app.get(&format!("/api/technicians/{tech_id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/bookings/me", Some(&alice)).await?.1, json!([]));
    let bob_login = json!({ "email": "bob@example.com", "password": "secret1" });
    let (status, _) = app.call(Method::POST, "/api/auth/login", None, Some(bob_login)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, users) = app.get("/api/admin/users", Some(&admin)).await?;
    let users = users.as_array().unwrap();
    let emails: Vec<&str> = users.iter().filter_map(|u| u["email"].as_str()).collect();
    assert!(!emails.contains(&"bob@example.com"));
    assert!(users.iter().any(|u| u["id"] == admin_id.as_str()));
    Ok(())
}
