// tests/rest_repository_tests.rs
//
// REST backend against a wiremock stand-in for the hosted data API.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atelier_common::models::CouponCode;
use atelier_core::repositories::rest::coupons::MAX_CAS_ATTEMPTS;
use atelier_core::repositories::{
    CouponRepository, ProfileRepository, RestClient, RestCouponRepository, RestProfileRepository,
};
use atelier_core::test_utils::fixtures::public_coupon;
use atelier_core::Error;

const COUPONS: &str = "/rest/v1/coupons";

async fn setup() -> (MockServer, RestCouponRepository) {
    let server = MockServer::start().await;
    let client = RestClient::new(&server.uri(), "anon-key").unwrap();
    (server, RestCouponRepository::new(client))
}

fn row(id: Uuid, code: &str, used: i32, limit: i32, created: &str) -> Value {
    json!({
        "coupon_id": id,
        "code": code,
        "discount_amount": 10,
        "is_public": true,
        "specific_user_id": null,
        "expiry_date": null,
        "usage_limit": limit,
        "used_count": used,
        "created_at": created,
    })
}

#[tokio::test]
async fn find_by_code_sends_filters_and_key() {
    let (server, repo) = setup().await;
    let newer = Uuid::new_v4();
    let older = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(COUPONS))
        .and(query_param("code", "eq.SAVE10"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(newer, "SAVE10", 0, 100, "2025-05-02T00:00:00Z"),
            row(older, "SAVE10", 7, 100, "2025-01-02T00:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let code = CouponCode::parse("save10").unwrap();
    let found = repo.find_coupons_by_code(&code).await.unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].coupon_id, newer);
    assert_eq!(found[1].used_count, 7);
}

#[tokio::test]
async fn increment_retries_after_a_lost_swap() {
    let (server, repo) = setup().await;
    let id = Uuid::new_v4();
    let created = "2025-05-01T00:00:00Z";

    // The first read sees 3; someone else gets there first, the second read sees 4.
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .and(query_param("coupon_id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, "RUSH", 3, 5, created)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .and(query_param("coupon_id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, "RUSH", 4, 5, created)])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .and(query_param("used_count", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .and(query_param("used_count", "eq.4"))
        .and(query_param("usage_limit", "gt.4"))
        .and(body_json(json!({ "used_count": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, "RUSH", 5, 5, created)])))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(repo.increment_usage_if_available(id).await.unwrap(), Some(5));
}

#[tokio::test]
async fn increment_skips_the_write_when_full() {
    let (server, repo) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([row(id, "FULL", 5, 5, "2025-05-01T00:00:00Z")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(repo.increment_usage_if_available(id).await.unwrap(), None);
}

#[tokio::test]
async fn increment_gives_up_under_constant_contention() {
    let (server, repo) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([row(id, "HOT", 1, 500, "2025-05-01T00:00:00Z")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(MAX_CAS_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let result = repo.increment_usage_if_available(id).await;
    assert!(
        matches!(result, Err(Error::StorageUnavailable(_))),
        "expected StorageUnavailable, got: {result:?}"
    );
}

#[tokio::test]
async fn increment_stops_when_the_limit_drops_mid_swap() {
    let (server, repo) = setup().await;
    let id = Uuid::new_v4();
    let created = "2025-05-01T00:00:00Z";

    // Read sees 4 of 10; an admin lowers the limit to 4 before the swap lands.
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, "EDITED", 4, 10, created)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, "EDITED", 4, 4, created)])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .and(query_param("usage_limit", "gt.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(repo.increment_usage_if_available(id).await.unwrap(), None);
}

#[tokio::test]
async fn update_refuses_a_limit_below_the_live_counter() {
    let (server, repo) = setup().await;
    let created = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let mut coupon = public_coupon("SPRING", 10, 10, created);
    coupon.usage_limit = 5;

    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .and(query_param("coupon_id", format!("eq.{}", coupon.coupon_id)))
        .and(query_param("used_count", "lte.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
            coupon.coupon_id,
            "SPRING",
            6,
            10,
            "2025-05-01T00:00:00Z"
        )])))
        .mount(&server)
        .await;

    let result = repo.update_coupon(&coupon).await;
    assert!(matches!(result, Err(Error::Validation(_))), "got: {result:?}");
}

#[tokio::test]
async fn update_of_a_missing_coupon_touches_nothing() {
    let (server, repo) = setup().await;
    let coupon = public_coupon("GONE", 10, 10, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());

    Mock::given(method("PATCH"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_eq!(repo.update_coupon(&coupon).await.unwrap(), 0);
}

#[tokio::test]
async fn conflict_on_insert_names_the_code() {
    let (server, repo) = setup().await;

    Mock::given(method("POST"))
        .and(path(COUPONS))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_string(r#"{"code":"23505","message":"duplicate key value"}"#),
        )
        .mount(&server)
        .await;

    let coupon = public_coupon("SAVE10", 10, 100, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let result = repo.create_coupon(&coupon).await;
    assert!(
        matches!(&result, Err(Error::DuplicateCode(code)) if code == "SAVE10"),
        "expected DuplicateCode, got: {result:?}"
    );
}

#[tokio::test]
async fn server_fault_is_storage_unavailable() {
    let (server, repo) = setup().await;

    Mock::given(method("GET"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = repo.list_coupons().await.unwrap_err();
    assert!(err.is_storage_unavailable(), "got: {err:?}");
}

#[tokio::test]
async fn rejected_key_is_forbidden() {
    let (server, repo) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(COUPONS))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let result = repo.delete_coupon(Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::Forbidden(_))), "got: {result:?}");
}

#[tokio::test]
async fn unknown_profile_is_none() {
    let server = MockServer::start().await;
    let repo = RestProfileRepository::new(RestClient::new(&server.uri(), "anon-key").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(repo.get_profile(Uuid::new_v4()).await.unwrap().is_none());
}
