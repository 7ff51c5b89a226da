use crate::accounting::{ActivityKind, MealCalorieDistribution, MealProgress};
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Gain,
    Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn from_category(category: &str) -> Option<Self> {
        match category.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub goal: Goal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub calories: f64,
    pub amount: f64,
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FoodEntry {
    /// Meal bucket the entry counts towards. Entries logged before meal types
    /// existed carry the meal in their category instead.
    pub fn meal_bucket(&self) -> Option<MealType> {
        self.meal_type
            .or_else(|| MealType::from_category(&self.category))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub name: String,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterCounter {
    pub owner_id: String,
    pub cups: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub owners: BTreeMap<String, Session>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(alias = "fid")]
    pub owner: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewFoodRequest {
    pub name: String,
    pub calories: f64,
    pub amount: f64,
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupFoodRequest {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub meal_type: Option<MealType>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewActivityRequest {
    pub activity: ActivityKind,
    pub duration_minutes: u32,
}

#[derive(Debug, Serialize)]
pub struct CatalogueEntry {
    pub activity: ActivityKind,
    pub label: &'static str,
    pub met: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WaterPayload {
    pub cups: u32,
}

#[derive(Debug, Deserialize)]
pub struct TapCupRequest {
    pub index: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartSlices {
    pub consumed: f64,
    pub burned: f64,
    pub remaining: f64,
}

#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub profile: UserProfile,
    pub target: f64,
    pub consumed: f64,
    pub burned: f64,
    pub remaining: f64,
    pub distribution: MealCalorieDistribution,
    pub meals: Vec<MealProgress>,
    pub chart: ChartSlices,
    pub water_cups: u32,
    pub food_count: usize,
    pub activity_count: usize,
}
