use crate::accounting::ActivityKind;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::models::{
    ActivityEntry, CatalogueEntry, DailySummary, DeleteResponse, FoodEntry, LookupFoodRequest,
    NewActivityRequest, NewFoodRequest, OwnerQuery, SuggestQuery, SuggestResponse,
    TapCupRequest, UserProfile, WaterPayload,
};
use crate::session::Action;
use crate::state::AppState;
use crate::stats::build_summary;
use crate::ui::render_index;
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

const GUEST_OWNER: &str = "guest";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    #[serde(alias = "fid")]
    pub owner: Option<String>,
}

pub async fn index(ApiQuery(query): ApiQuery<IndexQuery>) -> Html<String> {
    let owner = query
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .unwrap_or(GUEST_OWNER);
    Html(render_index(owner))
}

pub async fn list_foods(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<Vec<FoodEntry>>, AppError> {
    let owner = require_owner(&query)?;
    Ok(Json(state.session(owner).await.foods_newest_first()))
}

pub async fn create_food(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(payload): ApiJson<NewFoodRequest>,
) -> Result<(StatusCode, Json<FoodEntry>), AppError> {
    let owner = require_owner(&query)?;
    let entry = FoodEntry {
        id: new_id(),
        owner_id: owner.to_string(),
        name: payload.name.trim().to_string(),
        calories: payload.calories,
        amount: payload.amount,
        unit: payload.unit,
        category: payload.category,
        meal_type: payload.meal_type,
        image: payload.image,
        created_at: Utc::now(),
    };
    state.dispatch(owner, Action::AddFood(entry.clone())).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_food(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let owner = require_owner(&query)?;
    let id = require_id(&query)?;
    state.dispatch(owner, Action::RemoveFood(id.to_string())).await?;
    Ok(Json(DeleteResponse { success: true }))
}

pub async fn lookup_food(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(payload): ApiJson<LookupFoodRequest>,
) -> Result<(StatusCode, Json<FoodEntry>), AppError> {
    let owner = require_owner(&query)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Please enter a valid food name."));
    }
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err(AppError::bad_request("Please enter a valid amount."));
    }

    // The data lock is not held while the lookup is in flight.
    let resolved = state
        .lookup
        .resolve(name, payload.amount, &payload.unit)
        .await
        .inspect_err(|err| warn!(%owner, query = name, "food lookup failed: {err}"))?;

    let entry = FoodEntry {
        id: new_id(),
        owner_id: owner.to_string(),
        name: resolved.name,
        calories: resolved.calories,
        amount: payload.amount,
        unit: payload.unit,
        category: payload.category,
        meal_type: payload.meal_type,
        image: resolved.image_url,
        created_at: Utc::now(),
    };
    state.dispatch(owner, Action::AddFood(entry.clone())).await?;
    info!(%owner, food = %entry.name, calories = entry.calories, "logged food from lookup");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn suggest_foods(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SuggestQuery>,
) -> Result<Json<SuggestResponse>, AppError> {
    let suggestions = state.lookup.suggest(&query.query).await?;
    Ok(Json(SuggestResponse { suggestions }))
}

pub async fn get_water(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<WaterPayload>, AppError> {
    let owner = require_owner(&query)?;
    let cups = state.session(owner).await.water_cups();
    Ok(Json(WaterPayload { cups }))
}

pub async fn set_water(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(payload): ApiJson<WaterPayload>,
) -> Result<Json<WaterPayload>, AppError> {
    let owner = require_owner(&query)?;
    let action = Action::SetWater {
        cups: payload.cups,
        at: Utc::now(),
    };
    state.dispatch(owner, action).await?;
    Ok(Json(payload))
}

pub async fn tap_water(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(payload): ApiJson<TapCupRequest>,
) -> Result<Json<WaterPayload>, AppError> {
    let owner = require_owner(&query)?;
    let action = Action::TapCup {
        index: payload.index,
        at: Utc::now(),
    };
    let session = state.dispatch(owner, action).await?;
    Ok(Json(WaterPayload {
        cups: session.water_cups(),
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let owner = require_owner(&query)?;
    let session = state.session(owner).await;
    Ok(Json(*session.profile()?))
}

pub async fn put_profile(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(profile): ApiJson<UserProfile>,
) -> Result<Json<UserProfile>, AppError> {
    let owner = require_owner(&query)?;
    state.dispatch(owner, Action::SubmitProfile(profile)).await?;
    Ok(Json(profile))
}

pub async fn list_activities(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<Vec<ActivityEntry>>, AppError> {
    let owner = require_owner(&query)?;
    Ok(Json(state.session(owner).await.activities))
}

pub async fn create_activity(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ApiJson(payload): ApiJson<NewActivityRequest>,
) -> Result<(StatusCode, Json<ActivityEntry>), AppError> {
    let owner = require_owner(&query)?;
    let id = new_id();
    let action = Action::AddActivity {
        id: id.clone(),
        kind: payload.activity,
        duration_minutes: payload.duration_minutes,
        at: Utc::now(),
    };
    let session = state.dispatch(owner, action).await?;
    let entry = session
        .activities
        .into_iter()
        .find(|activity| activity.id == id)
        .ok_or_else(|| {
            AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "activity was not recorded")
        })?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let owner = require_owner(&query)?;
    let id = require_id(&query)?;
    state
        .dispatch(owner, Action::RemoveActivity(id.to_string()))
        .await?;
    Ok(Json(DeleteResponse { success: true }))
}

pub async fn activity_catalogue() -> Json<Vec<CatalogueEntry>> {
    Json(
        ActivityKind::ALL
            .iter()
            .map(|kind| CatalogueEntry {
                activity: *kind,
                label: kind.label(),
                met: kind.met(),
            })
            .collect(),
    )
}

pub async fn get_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<DailySummary>, AppError> {
    let owner = require_owner(&query)?;
    let session = state.session(owner).await;
    Ok(Json(build_summary(&state.accounting, &session)?))
}

pub async fn reset_day(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let owner = require_owner(&query)?;
    state.dispatch(owner, Action::ResetDay).await?;
    info!(%owner, "day reset");
    Ok(Json(DeleteResponse { success: true }))
}

pub async fn foods_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "GET, POST, DELETE")
}

pub async fn water_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "GET, POST")
}

fn method_not_allowed(method: &Method, allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        format!("Method {method} Not Allowed"),
    )
        .into_response()
}

fn require_owner(query: &OwnerQuery) -> Result<&str, AppError> {
    query
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing owner"))
}

fn require_id(query: &OwnerQuery) -> Result<&str, AppError> {
    query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing id"))
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
