//! Daily calorie accounting.
//!
//! Every function here is a pure function of its inputs. The constants that
//! shape the budget (per-kg maintenance factor, goal adjustment, floor and
//! meal split) travel in [`AccountingParams`] so they can be configured.

use crate::models::{ActivityEntry, FoodEntry, Goal, MealType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AccountingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Share of the daily target allocated to each meal bucket, as fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealSplit {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub snack: f64,
}

impl Default for MealSplit {
    fn default() -> Self {
        Self {
            breakfast: 0.30,
            lunch: 0.35,
            dinner: 0.25,
            snack: 0.10,
        }
    }
}

impl MealSplit {
    /// Builds a split from whole percentages, which must add up to 100.
    pub fn from_percentages(breakfast: u8, lunch: u8, dinner: u8, snack: u8) -> Option<Self> {
        let sum = u16::from(breakfast) + u16::from(lunch) + u16::from(dinner) + u16::from(snack);
        if sum != 100 {
            return None;
        }
        Some(Self {
            breakfast: f64::from(breakfast) / 100.0,
            lunch: f64::from(lunch) / 100.0,
            dinner: f64::from(dinner) / 100.0,
            snack: f64::from(snack) / 100.0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountingParams {
    pub maintenance_per_kg: f64,
    pub goal_adjustment: f64,
    pub calorie_floor: f64,
    pub meal_split: MealSplit,
}

impl Default for AccountingParams {
    fn default() -> Self {
        Self {
            maintenance_per_kg: 30.0,
            goal_adjustment: 500.0,
            calorie_floor: 1200.0,
            meal_split: MealSplit::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealCalorieDistribution {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub snack: f64,
    pub total: f64,
}

impl MealCalorieDistribution {
    pub fn target_for(&self, meal: MealType) -> f64 {
        match meal {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
            MealType::Snack => self.snack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealProgress {
    pub meal_type: MealType,
    pub target: f64,
    pub consumed: f64,
    /// Negative when the bucket is over its target.
    pub remaining: f64,
}

/// Activity catalogue with MET multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Running,
    Walking,
    Cycling,
    Swimming,
    Yoga,
    StrengthTraining,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        ActivityKind::Running,
        ActivityKind::Walking,
        ActivityKind::Cycling,
        ActivityKind::Swimming,
        ActivityKind::Yoga,
        ActivityKind::StrengthTraining,
    ];

    pub fn met(self) -> f64 {
        match self {
            ActivityKind::Running => 8.0,
            ActivityKind::Walking => 3.8,
            ActivityKind::Cycling => 6.0,
            ActivityKind::Swimming => 7.0,
            ActivityKind::Yoga => 2.5,
            ActivityKind::StrengthTraining => 6.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::Running => "Running (8 km/h)",
            ActivityKind::Walking => "Walking (5 km/h)",
            ActivityKind::Cycling => "Cycling (moderate)",
            ActivityKind::Swimming => "Swimming",
            ActivityKind::Yoga => "Yoga",
            ActivityKind::StrengthTraining => "Strength Training",
        }
    }
}

fn require_positive(value: f64, what: &str) -> Result<(), AccountingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AccountingError::InvalidArgument(format!(
            "{what} must be a positive number, got {value}"
        )))
    }
}

pub fn daily_target(
    params: &AccountingParams,
    weight_kg: f64,
    goal: Goal,
) -> Result<f64, AccountingError> {
    require_positive(weight_kg, "weight")?;
    let maintenance = weight_kg * params.maintenance_per_kg;
    let adjusted = match goal {
        Goal::Lose => maintenance - params.goal_adjustment,
        Goal::Gain => maintenance + params.goal_adjustment,
        Goal::Maintain => maintenance,
    };
    Ok(adjusted.max(params.calorie_floor))
}

/// Buckets are rounded independently, so they need not add up to `total`.
pub fn meal_distribution(split: &MealSplit, total: f64) -> MealCalorieDistribution {
    MealCalorieDistribution {
        breakfast: (total * split.breakfast).round(),
        lunch: (total * split.lunch).round(),
        dinner: (total * split.dinner).round(),
        snack: (total * split.snack).round(),
        total,
    }
}

pub fn consumed(foods: &[FoodEntry]) -> f64 {
    foods.iter().map(|food| food.calories).sum()
}

pub fn consumed_for_meal(foods: &[FoodEntry], meal: MealType) -> f64 {
    foods
        .iter()
        .filter(|food| food.meal_bucket() == Some(meal))
        .map(|food| food.calories)
        .sum()
}

pub fn burned(activities: &[ActivityEntry]) -> f64 {
    activities
        .iter()
        .map(|activity| f64::from(activity.calories_burned))
        .sum()
}

/// Headline remaining figure. Goes negative when over budget.
pub fn remaining(target: f64, consumed: f64, burned: f64) -> f64 {
    target - consumed + burned
}

/// Remaining calories for chart slices only, never below zero.
pub fn chart_remaining(target: f64, consumed: f64, burned: f64) -> f64 {
    remaining(target, consumed, burned).max(0.0)
}

pub fn meal_progress(
    meal: MealType,
    distribution: &MealCalorieDistribution,
    foods: &[FoodEntry],
) -> MealProgress {
    let target = distribution.target_for(meal);
    let consumed = consumed_for_meal(foods, meal);
    MealProgress {
        meal_type: meal,
        target,
        consumed,
        remaining: target - consumed,
    }
}

pub fn activity_calories(
    met: f64,
    weight_kg: f64,
    duration_minutes: u32,
) -> Result<u32, AccountingError> {
    require_positive(met, "MET value")?;
    require_positive(weight_kg, "weight")?;
    if duration_minutes == 0 {
        return Err(AccountingError::InvalidArgument(
            "duration must be at least one minute".into(),
        ));
    }
    let per_minute = met * 3.5 * weight_kg / 200.0;
    let total = (per_minute * f64::from(duration_minutes)).round();
    if total > f64::from(u32::MAX) {
        return Err(AccountingError::InvalidArgument(format!(
            "activity burn of {total} kcal is out of range"
        )));
    }
    Ok(total as u32)
}
