// File: atelier-server/src/routes/admin.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;
use atelier_common::models::{Coupon, Profile};
use atelier_core::services::{CouponDraft, CouponSummary};

use super::{ApiError, AppState, Requester};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/coupons", get(list_coupons).post(create_coupon))
        .route("/api/admin/coupons/{id}", put(update_coupon).delete(delete_coupon))
        .route("/api/admin/profiles", get(list_profiles))
}

async fn list_coupons(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
) -> Result<Json<Vec<CouponSummary>>, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    Ok(Json(ctx.admin_service.list(&session, Utc::now()).await?))
}

async fn create_coupon(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
    Json(draft): Json<CouponDraft>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    let coupon = ctx.admin_service.create(&session, &draft, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn update_coupon(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
    Path(id): Path<Uuid>,
    Json(draft): Json<CouponDraft>,
) -> Result<Json<Coupon>, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    Ok(Json(ctx.admin_service.update(&session, id, &draft).await?))
}

async fn delete_coupon(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    ctx.admin_service.delete(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_profiles(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    Ok(Json(ctx.admin_service.list_target_candidates(&session).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use atelier_common::models::Role;
    use atelier_core::test_utils::fixtures::profile;

    use crate::routes::test_support::{call, harness};

    #[tokio::test]
    async fn admin_crud_round() {
        let h = harness();
        let admin = profile(Role::Admin, Some("Studio Admin"), None);
        let client = profile(Role::User, Some("Grace"), Some("grace@example.com"));
        h.profiles.insert(admin.clone());
        h.profiles.insert(client.clone());
        let as_admin = Some(admin.id.to_string());

        let (status, created) = call(
            &h.app,
            "POST",
            "/api/admin/coupons",
            as_admin.clone(),
            Some(json!({
                "code": " vip5 ",
                "discount_percent": 5,
                "is_public": false,
                "target_user_id": client.id,
                "expiry_date": "2030-01-01",
                "usage_limit": 5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["code"], "VIP5");
        assert_eq!(created["used_count"], 0);
        let id = created["coupon_id"].as_str().unwrap().to_string();

        let (status, list) = call(&h.app, "GET", "/api/admin/coupons", as_admin.clone(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["target_name"], "Grace");
        assert_eq!(list[0]["expired"], false);

        let (status, _) = call(
            &h.app,
            "POST",
            "/api/admin/coupons",
            as_admin.clone(),
            Some(json!({"code": "VIP5"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, updated) = call(
            &h.app,
            "PUT",
            &format!("/api/admin/coupons/{id}"),
            as_admin.clone(),
            Some(json!({"code": "VIP5", "discount_percent": 20, "usage_limit": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["discount_percent"], 20);
        assert_eq!(updated["visibility"]["kind"], "public");

        let uri = format!("/api/admin/coupons/{id}");
        let (status, _) = call(&h.app, "DELETE", &uri, as_admin.clone(), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&h.app, "DELETE", &uri, as_admin, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_admins_are_turned_away() {
        let h = harness();
        let member = profile(Role::User, None, None);
        h.profiles.insert(member.clone());

        let (status, _) = call(&h.app, "GET", "/api/admin/coupons", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&h.app, "GET", "/api/admin/profiles", Some(member.id.to_string()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn invalid_draft_is_400() {
        let h = harness();
        let admin = profile(Role::Admin, None, None);
        h.profiles.insert(admin.clone());

        let (status, body) = call(
            &h.app,
            "POST",
            "/api/admin/coupons",
            Some(admin.id.to_string()),
            Some(json!({"code": "PRIVATE", "is_public": false})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please select a user for private coupons.");
    }
}
