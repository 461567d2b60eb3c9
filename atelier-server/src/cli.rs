//! atelier-server/src/cli.rs
//!
//! Command-line surface: `serve` plus the `coupon` admin console.

use chrono::{NaiveDate, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;
use atelier_common::models::CouponVisibility;
use atelier_core::auth::AppSession;
use atelier_core::services::{CouponDecision, CouponDraft, RedeemOutcome};
use atelier_core::{BackendKind, Error};

use crate::context::{ServerContext, DEMO_ADMIN_ID};

#[derive(Parser, Debug, Clone)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier - coupon engine and admin console for the studio site")]
pub struct Args {
    /// Store to use: "postgres", "rest" or "memory" (defaults from the environment)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Postgres connection URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Hosted backend base URL (overrides SUPABASE_URL)
    #[arg(long, global = true)]
    pub rest_url: Option<String>,

    /// Hosted backend API key (overrides SUPABASE_ANON_KEY)
    #[arg(long, global = true)]
    pub rest_key: Option<String>,

    /// Profile id to act as for admin commands
    #[arg(long = "as", global = true)]
    pub acting_as: Option<Uuid>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Flag values keyed by the environment variable they replace.
    pub fn override_for(&self, key: &str) -> Option<String> {
        match key {
            "ATELIER_BACKEND" => self.backend.clone(),
            "DATABASE_URL" => self.database_url.clone(),
            "SUPABASE_URL" => self.rest_url.clone(),
            "SUPABASE_ANON_KEY" => self.rest_key.clone(),
            "ATELIER_BIND" => match &self.command {
                Command::Serve { bind } => bind.clone(),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides ATELIER_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Manage and test coupons
    #[command(subcommand)]
    Coupon(CouponCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CouponCommand {
    /// List all coupons, newest first
    List,
    /// Create a coupon
    Create(DraftArgs),
    /// Replace the editable fields of a coupon
    Update {
        id: Uuid,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete a coupon
    Delete { id: Uuid },
    /// Evaluate a code without consuming it
    Check {
        code: String,
        /// Requester profile id (omit for a signed-out visitor)
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Record one use of a coupon
    Redeem { id: Uuid },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DraftArgs {
    #[arg(long)]
    pub code: String,

    #[arg(long, default_value_t = 10)]
    pub discount: i32,

    /// Restrict the coupon to this profile id
    #[arg(long)]
    pub user: Option<Uuid>,

    /// Last valid day, YYYY-MM-DD
    #[arg(long)]
    pub expires: Option<NaiveDate>,

    #[arg(long, default_value_t = 100)]
    pub limit: i32,
}

impl From<DraftArgs> for CouponDraft {
    fn from(a: DraftArgs) -> Self {
        CouponDraft {
            code: a.code,
            discount_percent: a.discount,
            is_public: a.user.is_none(),
            target_user_id: a.user,
            expiry_date: a.expires,
            usage_limit: a.limit,
        }
    }
}

async fn admin_session(ctx: &ServerContext, acting_as: Option<Uuid>) -> Result<AppSession, Error> {
    let id = match (acting_as, ctx.config.backend) {
        (Some(id), _) => Some(id),
        (None, BackendKind::Memory) => Some(DEMO_ADMIN_ID),
        (None, _) => None,
    };
    ctx.session_loader.load(id).await
}

pub async fn run_coupon_command(
    ctx: &ServerContext,
    acting_as: Option<Uuid>,
    cmd: CouponCommand,
) -> Result<(), Error> {
    let now = Utc::now();
    match cmd {
        CouponCommand::List => {
            let session = admin_session(ctx, acting_as).await?;
            let rows = ctx.admin_service.list(&session, now).await?;
            if rows.is_empty() {
                println!("No coupons yet.");
            }
            for row in rows {
                let c = &row.coupon;
                let expires = c
                    .expires_at
                    .map(|e| e.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".into());
                let mut flags = Vec::new();
                if row.expired {
                    flags.push("EXPIRED");
                }
                if row.exhausted {
                    flags.push("SOLD OUT");
                }
                println!(
                    "{}  {:<16} {:>4}  used {}/{} ({}%, {} left)  expires {}  {}  {}",
                    c.coupon_id,
                    c.code,
                    c.discount_percent.to_string(),
                    c.used_count,
                    c.usage_limit,
                    row.usage_percent,
                    row.remaining_uses,
                    expires,
                    row.target_name.as_deref().unwrap_or("global"),
                    flags.join(" "),
                );
            }
        }
        CouponCommand::Create(draft) => {
            let session = admin_session(ctx, acting_as).await?;
            let c = ctx.admin_service.create(&session, &draft.into(), now).await?;
            println!("Created coupon {} ({}), {} off", c.code, c.coupon_id, c.discount_percent);
        }
        CouponCommand::Update { id, draft } => {
            let session = admin_session(ctx, acting_as).await?;
            let c = ctx.admin_service.update(&session, id, &draft.into()).await?;
            let who = match c.visibility {
                CouponVisibility::Public => "everyone".to_string(),
                CouponVisibility::Targeted { requester_id } => requester_id.to_string(),
            };
            println!("Updated coupon {} ({} off, for {})", c.code, c.discount_percent, who);
        }
        CouponCommand::Delete { id } => {
            let session = admin_session(ctx, acting_as).await?;
            ctx.admin_service.delete(&session, id).await?;
            println!("Deleted coupon {id}");
        }
        CouponCommand::Check { code, user } => {
            let session = ctx.session_loader.load(user).await?;
            match ctx.coupon_service.evaluate(&code, now, session.requester_id()).await? {
                CouponDecision::Approved { coupon_id, discount_percent } => {
                    println!("OK: {} off (coupon {})", discount_percent, coupon_id);
                }
                CouponDecision::Rejected { reason } => {
                    println!("Rejected ({}): {}", reason, reason.user_message());
                }
            }
        }
        CouponCommand::Redeem { id } => match ctx.coupon_service.redeem(id).await? {
            RedeemOutcome::Redeemed { used_count, .. } => {
                info!("redeemed {} from the console", id);
                println!("Redeemed; coupon {id} has now been used {used_count} times");
            }
            RedeemOutcome::Rejected { reason } => {
                println!("Not redeemed ({}): {}", reason, reason.user_message());
            }
        },
    }
    Ok(())
}
