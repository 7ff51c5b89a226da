//! Per-owner tracker state and the single function that changes it.
//!
//! Handlers build an [`Action`] (assigning ids and timestamps up front), hand
//! it to [`Session::apply`], and persist only when the result is
//! [`Transition::Changed`]. A rejected action leaves the session untouched.

use crate::accounting::{self, AccountingError, ActivityKind};
use crate::models::{ActivityEntry, FoodEntry, UserProfile, WaterCounter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_CUPS: u32 = 8;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("{0}")]
    Invalid(String),
    #[error("submit current weight, target weight and goal first")]
    ProfileRequired,
    #[error(transparent)]
    Accounting(#[from] AccountingError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SubmitProfile(UserProfile),
    AddFood(FoodEntry),
    RemoveFood(String),
    /// Burn is computed from the profile weight at the moment it applies.
    AddActivity {
        id: String,
        kind: ActivityKind,
        duration_minutes: u32,
        at: DateTime<Utc>,
    },
    RemoveActivity(String),
    SetWater { cups: u32, at: DateTime<Utc> },
    TapCup { index: u32, at: DateTime<Utc> },
    ResetDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
    #[serde(default)]
    pub activities: Vec<ActivityEntry>,
    #[serde(default)]
    pub water: Option<WaterCounter>,
}

impl Session {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    pub fn profile(&self) -> Result<&UserProfile, SessionError> {
        self.profile.as_ref().ok_or(SessionError::ProfileRequired)
    }

    pub fn water_cups(&self) -> u32 {
        self.water.as_ref().map_or(0, |water| water.cups)
    }

    /// Food entries, newest first.
    pub fn foods_newest_first(&self) -> Vec<FoodEntry> {
        let mut foods: Vec<FoodEntry> = self.foods.iter().rev().cloned().collect();
        foods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        foods
    }

    pub fn apply(&mut self, action: Action) -> Result<Transition, SessionError> {
        match action {
            Action::SubmitProfile(profile) => {
                validate_profile(&profile)?;
                if self.profile == Some(profile) {
                    return Ok(Transition::Unchanged);
                }
                self.profile = Some(profile);
                Ok(Transition::Changed)
            }
            Action::AddFood(food) => {
                validate_food(&food)?;
                if self.foods.iter().any(|existing| existing.id == food.id) {
                    return Err(SessionError::Invalid(format!(
                        "food entry {} already exists",
                        food.id
                    )));
                }
                self.foods.push(food);
                Ok(Transition::Changed)
            }
            Action::RemoveFood(id) => {
                let before = self.foods.len();
                self.foods.retain(|food| food.id != id);
                Ok(changed_if(self.foods.len() != before))
            }
            Action::AddActivity {
                id,
                kind,
                duration_minutes,
                at,
            } => {
                let weight_kg = self.profile()?.current_weight_kg;
                if self.activities.iter().any(|existing| existing.id == id) {
                    return Err(SessionError::Invalid(format!(
                        "activity {id} already exists"
                    )));
                }
                let calories_burned =
                    accounting::activity_calories(kind.met(), weight_kg, duration_minutes)?;
                self.activities.push(ActivityEntry {
                    id,
                    kind,
                    name: kind.label().to_string(),
                    duration_minutes,
                    calories_burned,
                    created_at: at,
                });
                Ok(Transition::Changed)
            }
            Action::RemoveActivity(id) => {
                let before = self.activities.len();
                self.activities.retain(|activity| activity.id != id);
                Ok(changed_if(self.activities.len() != before))
            }
            Action::SetWater { cups, at } => {
                self.water = Some(WaterCounter {
                    owner_id: self.owner_id.clone(),
                    cups,
                    updated_at: at,
                });
                Ok(Transition::Changed)
            }
            Action::TapCup { index, at } => {
                if index >= MAX_CUPS {
                    return Err(SessionError::Invalid(format!(
                        "cup index must be below {MAX_CUPS}"
                    )));
                }
                let cups = tapped_cups(self.water_cups(), index);
                self.apply(Action::SetWater { cups, at })
            }
            Action::ResetDay => {
                if self.foods.is_empty() && self.activities.is_empty() && self.water.is_none() {
                    return Ok(Transition::Unchanged);
                }
                self.foods.clear();
                self.activities.clear();
                self.water = None;
                Ok(Transition::Changed)
            }
        }
    }
}

/// Tapping the cup at the current fill level empties it; tapping any other
/// cup fills the tracker up to and including that cup.
pub fn tapped_cups(current: u32, index: u32) -> u32 {
    let level = index.saturating_add(1).min(MAX_CUPS);
    if current == level { level - 1 } else { level }
}

fn changed_if(changed: bool) -> Transition {
    if changed {
        Transition::Changed
    } else {
        Transition::Unchanged
    }
}

fn validate_profile(profile: &UserProfile) -> Result<(), SessionError> {
    let valid = |weight: f64| weight.is_finite() && weight > 0.0;
    if !valid(profile.current_weight_kg) || !valid(profile.target_weight_kg) {
        return Err(SessionError::Invalid(
            "weights must be positive numbers".into(),
        ));
    }
    Ok(())
}

fn validate_food(food: &FoodEntry) -> Result<(), SessionError> {
    if food.name.trim().is_empty() {
        return Err(SessionError::Invalid("food name must not be empty".into()));
    }
    if !food.amount.is_finite() || food.amount <= 0.0 {
        return Err(SessionError::Invalid("amount must be a positive number".into()));
    }
    if !food.calories.is_finite() || food.calories < 0.0 {
        return Err(SessionError::Invalid("calories must not be negative".into()));
    }
    Ok(())
}
