// File: workshop-core/src/http/handlers.rs

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use workshop_common::models::rank::RankStanding;
use workshop_common::models::{
    Account, ApprovedSubmission, Banner, BannerLayout, Collection, CollectionSnapshot, LikeOutcome, Mission,
    MissionDraft, MissionSubmission, MissionSuggestion, PointReason, Product, ProductCategory,
    ProductDraft, Redemption, RedemptionReceipt, Wish,
};

use crate::http::error::ApiError;
use crate::services::WorkshopServices;
use crate::Error;

pub type AppState = Arc<WorkshopServices>;
type ApiResult<T> = Result<Json<T>, ApiError>;

// ----------------------------------------------------------------------
// Request bodies
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GuestLoginRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub amount: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub account_id: String,
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishRequest {
    pub account_id: String,
    pub item_name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerRequest {
    pub image_url: String,
    #[serde(flatten)]
    pub layout: BannerLayout,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub account: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownResponse {
    pub active: bool,
    pub remaining_seconds: i64,
}

// ----------------------------------------------------------------------
// Accounts
// ----------------------------------------------------------------------

pub async fn register(State(s): State<AppState>, Json(req): Json<RegisterRequest>) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = s.accounts.register(&req.name, &req.password, req.grade.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn login(State(s): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Account> {
    Ok(Json(s.accounts.authenticate(&req.name, &req.password).await?))
}

pub async fn login_admin(State(s): State<AppState>, Json(req): Json<AdminLoginRequest>) -> ApiResult<Account> {
    Ok(Json(s.accounts.login_admin(&req.password).await?))
}

pub async fn login_guest(State(s): State<AppState>, Json(req): Json<GuestLoginRequest>) -> ApiResult<Account> {
    Ok(Json(s.accounts.login_guest(&req.code).await?))
}

pub async fn list_accounts(State(s): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<Account>> {
    let accounts = if q.pending {
        s.accounts.list_pending_registrations().await?
    } else {
        s.accounts.list_accounts().await?
    };
    Ok(Json(accounts))
}

pub async fn get_account(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Account> {
    Ok(Json(s.accounts.get_account(&id).await?))
}

pub async fn approve_account(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Account> {
    Ok(Json(s.accounts.approve(&id).await?))
}

pub async fn delete_account(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.accounts.delete_account(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_points(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<GrantRequest>,
) -> ApiResult<Account> {
    Ok(Json(s.accounts.grant_points(&id, req.amount, req.reason.as_deref()).await?))
}

pub async fn account_rank(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<RankStanding> {
    Ok(Json(s.accounts.rank(&id).await?))
}

pub async fn encouragement(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let account = s.accounts.get_account(&id).await?;
    let message = s.encouragement.encourage(&account).await;
    Ok(Json(json!({ "message": message })))
}

pub async fn daily_mission(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<MissionSuggestion> {
    let account = s.accounts.get_account(&id).await?;
    Ok(Json(s.encouragement.suggest_daily_mission(&account).await))
}

pub async fn completed_today(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<String>> {
    let ids = s.missions.today_completed_mission_ids(&id).await?;
    Ok(Json(ids.into_iter().collect()))
}

pub async fn wish_cooldown(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<CooldownResponse> {
    let remaining = s.wishes.cooldown_remaining(&id).await?;
    Ok(Json(CooldownResponse {
        active: remaining.is_some(),
        remaining_seconds: remaining.map(|d| d.num_seconds()).unwrap_or(0),
    }))
}

// ----------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------

pub async fn list_products(State(s): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(Json(s.catalog.list_products().await?))
}

pub async fn add_product(State(s): State<AppState>, Json(draft): Json<ProductDraft>) -> Result<(StatusCode, Json<Product>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.catalog.add_product(draft).await?)))
}

pub async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<Product> {
    Ok(Json(s.catalog.update_product(&id, draft).await?))
}

pub async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.catalog.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_stock(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StockRequest>,
) -> ApiResult<Product> {
    Ok(Json(s.catalog.set_stock(&id, req.stock).await?))
}

pub async fn list_categories(State(s): State<AppState>) -> ApiResult<Vec<ProductCategory>> {
    Ok(Json(s.catalog.list_categories().await?))
}

pub async fn add_category(State(s): State<AppState>, Json(req): Json<NameRequest>) -> Result<(StatusCode, Json<ProductCategory>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.catalog.add_category(&req.name).await?)))
}

pub async fn delete_category(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.catalog.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_banners(State(s): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<Banner>> {
    let banners = if q.active {
        s.catalog.list_active_banners().await?
    } else {
        s.catalog.list_banners().await?
    };
    Ok(Json(banners))
}

pub async fn add_banner(State(s): State<AppState>, Json(req): Json<BannerRequest>) -> Result<(StatusCode, Json<Banner>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.catalog.add_banner(&req.image_url, req.layout).await?)))
}

pub async fn set_banner_active(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActiveRequest>,
) -> ApiResult<Banner> {
    Ok(Json(s.catalog.set_banner_active(&id, req.active).await?))
}

pub async fn delete_banner(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.catalog.delete_banner(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_point_reasons(State(s): State<AppState>) -> ApiResult<Vec<PointReason>> {
    Ok(Json(s.catalog.list_point_reasons().await?))
}

pub async fn add_point_reason(State(s): State<AppState>, Json(req): Json<TitleRequest>) -> Result<(StatusCode, Json<PointReason>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.catalog.add_point_reason(&req.title).await?)))
}

pub async fn delete_point_reason(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.catalog.delete_point_reason(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------------
// Redemptions
// ----------------------------------------------------------------------

pub async fn create_redemption(
    State(s): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<(StatusCode, Json<RedemptionReceipt>), ApiError> {
    let receipt = s.redemptions.create_redemption(&req.account_id, &req.product_id).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_redemptions(State(s): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<Redemption>> {
    let mut list = match q.q.as_deref() {
        Some(term) => s.redemptions.search_redemptions(term).await?,
        None => s.redemptions.list_redemptions().await?,
    };
    if let Some(account) = q.account.as_deref() {
        list.retain(|r| r.account_id == account);
    }
    if q.pending {
        list.retain(|r| !r.status.is_terminal());
    }
    Ok(Json(list))
}

pub async fn lookup_redemption(State(s): State<AppState>, Path(code): Path<String>) -> ApiResult<Redemption> {
    Ok(Json(s.redemptions.lookup_by_code(&code).await?))
}

pub async fn confirm_redemption(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Redemption> {
    Ok(Json(s.redemptions.confirm_redemption(&id).await?))
}

pub async fn cancel_redemption(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Redemption> {
    Ok(Json(s.redemptions.cancel_redemption(&id).await?))
}

// ----------------------------------------------------------------------
// Missions
// ----------------------------------------------------------------------

pub async fn list_missions(State(s): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<Mission>> {
    let missions = if q.active {
        s.missions.list_active_missions().await?
    } else {
        s.missions.list_missions().await?
    };
    Ok(Json(missions))
}

pub async fn create_mission(State(s): State<AppState>, Json(draft): Json<MissionDraft>) -> Result<(StatusCode, Json<Mission>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.missions.create_mission(draft).await?)))
}

pub async fn update_mission(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<MissionDraft>,
) -> ApiResult<Mission> {
    Ok(Json(s.missions.update_mission(&id, draft).await?))
}

pub async fn delete_mission(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.missions.delete_mission(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_mission(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Mission> {
    Ok(Json(s.missions.toggle_mission(&id).await?))
}

pub async fn submit_mission(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AccountRequest>,
) -> Result<(StatusCode, Json<MissionSubmission>), ApiError> {
    let submission = s.missions.submit(&req.account_id, &id).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn list_submissions(State(s): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<MissionSubmission>> {
    let mut list = match q.account.as_deref() {
        Some(account) => s.missions.list_submissions_for_account(account).await?,
        None => s.missions.list_submissions().await?,
    };
    if q.pending {
        list.retain(|sub| sub.status == workshop_common::models::SubmissionStatus::Pending);
    }
    Ok(Json(list))
}

pub async fn approve_submission(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<ApprovedSubmission> {
    Ok(Json(s.missions.approve_submission(&id).await?))
}

pub async fn reject_submission(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<MissionSubmission> {
    Ok(Json(s.missions.reject_submission(&id).await?))
}

// ----------------------------------------------------------------------
// Wishes
// ----------------------------------------------------------------------

pub async fn list_wishes(State(s): State<AppState>) -> ApiResult<Vec<Wish>> {
    Ok(Json(s.wishes.list_wishes().await?))
}

pub async fn post_wish(State(s): State<AppState>, Json(req): Json<WishRequest>) -> Result<(StatusCode, Json<Wish>), ApiError> {
    let wish = s.wishes.post_wish(&req.account_id, &req.item_name, &req.description).await?;
    Ok((StatusCode::CREATED, Json(wish)))
}

pub async fn like_wish(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AccountRequest>,
) -> ApiResult<LikeOutcome> {
    Ok(Json(s.wishes.like_wish(&id, &req.account_id).await?))
}

pub async fn delete_wish(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    s.wishes.delete_wish(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_cooldown(State(s): State<AppState>, Json(req): Json<AccountRequest>) -> ApiResult<Account> {
    Ok(Json(s.wishes.reset_cooldown(&req.account_id).await?))
}

// ----------------------------------------------------------------------
// Live snapshots
// ----------------------------------------------------------------------

/// Strips credentials from account snapshots before they leave the process.
fn public_snapshot(mut snapshot: CollectionSnapshot) -> CollectionSnapshot {
    if snapshot.collection == Collection::Accounts {
        for doc in &mut snapshot.documents {
            Account::redact_body(&mut doc.body);
        }
    }
    snapshot
}

/// One SSE event per committed snapshot of the collection, starting with
/// the current one. The stream ends when the store closes its subscriptions.
pub async fn subscribe(
    State(s): State<AppState>,
    Path(name): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let collection = Collection::from_name(&name)
        .ok_or_else(|| Error::NotFound(format!("collection '{}'", name)))?;
    let subscription = s.store().subscribe(collection).await?;

    let events = stream::unfold(subscription, |mut sub| async move {
        let snapshot = public_snapshot(sub.next().await?);
        let event = match Event::default().event(sub.collection().as_str()).json_data(&snapshot) {
            Ok(event) => event,
            Err(e) => {
                warn!("could not encode {} snapshot: {}", sub.collection(), e);
                Event::default().event("error").data(e.to_string())
            }
        };
        Some((Ok(event), sub))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
