// File: atelier-server/src/routes/checkout.rs

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use atelier_core::services::{CheckoutOutcome, CouponDecision, RedeemOutcome, RejectionReason};

use super::{ApiError, AppState, Requester};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/coupons/evaluate", post(evaluate))
        .route("/api/coupons/redeem", post(redeem))
        .route("/api/checkout/apply", post(apply))
}

#[derive(Debug, Deserialize)]
pub struct CodeBody {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
    pub coupon_id: Uuid,
}

fn rejected(status: StatusCode, reason: RejectionReason) -> Response {
    (
        status,
        Json(json!({
            "status": "rejected",
            "reason": reason,
            "message": reason.user_message(),
        })),
    )
        .into_response()
}

/// Previews a code for the current visitor. Never consumes a use.
async fn evaluate(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
    Json(body): Json<CodeBody>,
) -> Result<Response, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    let decision = ctx
        .coupon_service
        .evaluate(&body.code, Utc::now(), session.requester_id())
        .await?;

    Ok(match decision {
        CouponDecision::Approved { coupon_id, discount_percent } => Json(json!({
            "status": "approved",
            "coupon_id": coupon_id,
            "discount_percent": discount_percent,
            "message": format!("Coupon Applied! You get {}% OFF.", discount_percent.get()),
        }))
        .into_response(),
        CouponDecision::Rejected { reason } => rejected(StatusCode::UNPROCESSABLE_ENTITY, reason),
    })
}

async fn redeem(
    State(ctx): State<AppState>,
    Json(body): Json<RedeemBody>,
) -> Result<Response, ApiError> {
    Ok(match ctx.coupon_service.redeem(body.coupon_id).await? {
        outcome @ RedeemOutcome::Redeemed { .. } => Json(outcome).into_response(),
        RedeemOutcome::Rejected { reason } => rejected(StatusCode::CONFLICT, reason),
    })
}

/// Validates and consumes the code as part of completing a checkout.
async fn apply(
    State(ctx): State<AppState>,
    Requester(requester): Requester,
    Json(body): Json<CodeBody>,
) -> Result<Response, ApiError> {
    let session = ctx.session_loader.load(requester).await?;
    let outcome = ctx
        .coupon_service
        .checkout(&body.code, Utc::now(), session.requester_id())
        .await?;

    Ok(match outcome {
        applied @ CheckoutOutcome::Applied { .. } => Json(applied).into_response(),
        // Losing the last use between the check and the increment is a conflict,
        // everything else is a plain rejection of the submitted code.
        CheckoutOutcome::Rejected { reason: reason @ RejectionReason::UsageLimitReached } => {
            rejected(StatusCode::CONFLICT, reason)
        }
        CheckoutOutcome::Rejected { reason } => rejected(StatusCode::UNPROCESSABLE_ENTITY, reason),
    })
}
