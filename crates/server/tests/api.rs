mod support;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;

use support::*;

#[tokio::test]
async fn health_and_openapi_are_public() -> anyhow::Result<()> {
    let app = app().await?;
    let reply = send(&app, get("/health", None)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({"status": "ok"}));

    let reply = send(&app, get("/api-docs/openapi.json", None)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["paths"]["/api/bookings"].is_object());
    Ok(())
}

#[tokio::test]
async fn register_sets_cookie_and_token_works_on_every_transport() -> anyhow::Result<()> {
    let app = app().await?;
    let body = json!({ "name": "Alice", "email": "Alice@Example.com", "password": PASSWORD });
    let reply = send(&app, json_request("POST", "/api/auth/register", None, &body)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["role"], "user");
    let token = reply.body["token"].as_str().unwrap().to_string();
    assert!(reply.set_cookie.unwrap().starts_with("auth_token="));

    let reply = send(&app, get("/api/profile/me", Some(&token))?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], "alice@example.com");
    assert!(reply.body.get("passwordHash").is_none());

    let req = Request::builder()
        .uri("/api/profile/me")
        .header("x-auth-token", token.as_str())
        .body(Body::empty())?;
    assert_eq!(send(&app, req).await?.status, StatusCode::OK);

    let req = Request::builder()
        .uri("/api/profile/me")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())?;
    assert_eq!(send(&app, req).await?.status, StatusCode::OK);

    let reply = send(&app, get("/api/profile/me", None)?).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body["error"].is_string());

    let req = Request::builder()
        .uri("/api/profile/me")
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .body(Body::empty())?;
    assert_eq!(send(&app, req).await?.status, StatusCode::UNAUTHORIZED);

    let reply = send(&app, get("/api/profile/me", Some("not-a-jwt"))?).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> anyhow::Result<()> {
    let app = app().await?;
    register(&app, "Bob", "bob@example.com", "user").await?;

    let wrong_password = login(&app, "bob@example.com", "nope-nope").await?;
    let unknown_email = login(&app, "nobody@example.com", PASSWORD).await?;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);

    let ok = login(&app, "  BOB@example.com ", PASSWORD).await?;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.body["token"].is_string());
    Ok(())
}

#[tokio::test]
async fn register_rejects_bad_input() -> anyhow::Result<()> {
    let app = app().await?;
    register(&app, "Carol", "carol@example.com", "user").await?;

    let dup = json!({ "name": "Carol 2", "email": "CAROL@example.com", "password": PASSWORD });
    let reply = send(&app, json_request("POST", "/api/auth/register", None, &dup)?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let short = json!({ "name": "Dan", "email": "dan@example.com", "password": "123" });
    let reply = send(&app, json_request("POST", "/api/auth/register", None, &short)?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let admin =
        json!({ "name": "Eve", "email": "eve@example.com", "password": PASSWORD, "role": "admin" });
    let reply = send(&app, json_request("POST", "/api/auth/register", None, &admin)?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let reply = send(&app, req).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn role_guards_answer_403() -> anyhow::Result<()> {
    let app = app().await?;
    let (user, _) = register(&app, "Uma", "uma@example.com", "user").await?;
    let (tech, _) = register(&app, "Tom", "tom@example.com", "technician").await?;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let admin = admin.body["token"].as_str().unwrap().to_string();

    let reply = send(&app, get("/api/admin/users", Some(&user))?).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(get_status(&app, "/api/admin/users", Some(&tech)).await?, StatusCode::FORBIDDEN);
    assert_eq!(get_status(&app, "/api/admin/users", Some(&admin)).await?, StatusCode::OK);

    let own_profile = "/api/profile/technician/me";
    assert_eq!(get_status(&app, own_profile, Some(&user)).await?, StatusCode::FORBIDDEN);
    assert_eq!(get_status(&app, own_profile, Some(&tech)).await?, StatusCode::OK);

    let booking = booking_body(uuid::Uuid::new_v4());
    let reply = send(&app, json_request("POST", "/api/bookings", Some(&tech), &booking)?).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply = send(&app, json_request("POST", "/api/bookings", Some(&user), &booking)?).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    assert_eq!(get_status(&app, "/api/bookings/me", Some(&admin)).await?, StatusCode::FORBIDDEN);
    assert_eq!(send(&app, get("/api/bookings/me", Some(&user))?).await?.body, json!([]));

    let status = json!({ "status": "confirmed" });
    let uri = format!("/api/bookings/{}/status", uuid::Uuid::new_v4());
    let reply = send(&app, json_request("PUT", &uri, Some(&user), &status)?).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply = send(&app, json_request("PUT", &uri, Some(&tech), &status)?).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn public_reads_handle_missing_and_malformed_ids() -> anyhow::Result<()> {
    let app = app().await?;
    assert_eq!(send(&app, get("/api/technicians", None)?).await?.body, json!([]));
    assert_eq!(get_status(&app, "/api/technicians/not-a-uuid", None).await?, StatusCode::NOT_FOUND);
    let uri = format!("/api/technicians/{}", uuid::Uuid::new_v4());
    assert_eq!(send(&app, get(&uri, None)?).await?.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, get("/api/reviews/garbage", None)?).await?.status, StatusCode::NOT_FOUND);

    let uri = "/api/technicians/search?service=plumb&location=nowhere";
    let reply = send(&app, get(uri, None)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn admin_cannot_demote_or_delete_themselves() -> anyhow::Result<()> {
    let app = app().await?;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let admin_id = admin.body["userId"].as_str().unwrap().to_string();
    let admin = admin.body["token"].as_str().unwrap().to_string();

    let uri = format!("/api/admin/users/{admin_id}/role");
    let demote = json!({ "role": "user" });
    let reply = send(&app, json_request("PUT", &uri, Some(&admin), &demote)?).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/users/{admin_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::empty())?;
    assert_eq!(send(&app, req).await?.status, StatusCode::FORBIDDEN);

    let (_, uid) = register(&app, "Vic", "vic@example.com", "user").await?;
    let uri = format!("/api/admin/users/{uid}/role");
    let bogus = json!({ "role": "wizard" });
    let reply = send(&app, json_request("PUT", &uri, Some(&admin), &bogus)?).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let promote = json!({ "role": "technician" });
    let reply = send(&app, json_request("PUT", &uri, Some(&admin), &promote)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["role"], "technician");

    let reply = send(&app, get("/api/admin/unverified-technicians", Some(&admin))?).await?;
    let list = reply.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["userId"], uid.as_str());
    Ok(())
}

#[tokio::test]
async fn without_a_secret_no_token_is_issued_or_accepted() -> anyhow::Result<()> {
    let app = app_with(auth_config(None)).await?;
    let body = json!({ "name": "Nia", "email": "nia@example.com", "password": PASSWORD });
    let reply = send(&app, json_request("POST", "/api/auth/register", None, &body)?).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["token"].is_null());
    assert!(reply.set_cookie.is_none());

    let reply = send(&app, get("/api/profile/me", Some("anything"))?).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_always_expires_the_cookie() -> anyhow::Result<()> {
    let app = app().await?;
    let (token, _) = register(&app, "Lou", "lou@example.com", "user").await?;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())?;
    let reply = send(&app, req).await?;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let cleared = reply.set_cookie.unwrap_or_default();
    assert!(cleared.starts_with("auth_token=;"), "{cleared}");
    assert!(cleared.contains("Max-Age=0"), "{cleared}");

    let req = Request::builder().method("POST").uri("/api/auth/logout").body(Body::empty())?;
    let reply = send(&app, req).await?;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let cleared = reply.set_cookie.unwrap_or_default();
    assert!(cleared.starts_with("auth_token=;"), "{cleared}");
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_account_is_unauthenticated() -> anyhow::Result<()> {
    let app = app().await?;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let admin = admin.body["token"].as_str().unwrap_or_default().to_string();
    let (gone, gone_id) = register(&app, "Gus", "gus@example.com", "user").await?;
    let (gone_tech, gone_tech_id) = register(&app, "Tia", "tia@example.com", "technician").await?;

    for id in [&gone_id, &gone_tech_id] {
        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/users/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())?;
        assert_eq!(send(&app, req).await?.status, StatusCode::OK);
    }

    let booking = booking_body(uuid::Uuid::new_v4());
    let reply = send(&app, json_request("POST", "/api/bookings", Some(&gone), &booking)?).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body["error"].is_string());

    let profile = json!({
        "servicesOffered": ["Plumbing"],
        "contactNumber": "0123456789",
        "location": "Giza",
    });
    let req = json_request("POST", "/api/profile/technician", Some(&gone_tech), &profile)?;
    assert_eq!(send(&app, req).await?.status, StatusCode::UNAUTHORIZED);

    assert_eq!(get_status(&app, "/api/profile/me", Some(&gone)).await?, StatusCode::UNAUTHORIZED);
    Ok(())
}
