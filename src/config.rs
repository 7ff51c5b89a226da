use crate::accounting::{AccountingParams, MealSplit};
use std::{env, path::PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";
pub const DEFAULT_SPOONACULAR_URL: &str = "https://api.spoonacular.com";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://spoonacular.com/cdn/ingredients_100x100";

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub lookup: LookupConfig,
    pub accounting: AccountingParams,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Values that fail
    /// to parse fall back to their defaults.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AccountingParams::default();

        let port = parsed(&var, "PORT").unwrap_or(DEFAULT_PORT);
        let data_path = var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let api_keys = var("SPOONACULAR_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let meal_split = var("MEAL_SPLIT")
            .and_then(|raw| {
                let split = parse_meal_split(&raw);
                if split.is_none() {
                    warn!(value = %raw, "MEAL_SPLIT must be four percentages adding up to 100; using defaults");
                }
                split
            })
            .unwrap_or(defaults.meal_split);

        Self {
            port,
            data_path,
            lookup: LookupConfig {
                base_url: var("SPOONACULAR_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SPOONACULAR_URL.to_string()),
                image_base_url: var("SPOONACULAR_IMAGE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
                api_keys,
            },
            accounting: AccountingParams {
                maintenance_per_kg: positive(&var, "MAINTENANCE_KCAL_PER_KG")
                    .unwrap_or(defaults.maintenance_per_kg),
                goal_adjustment: positive(&var, "GOAL_ADJUSTMENT_KCAL")
                    .unwrap_or(defaults.goal_adjustment),
                calorie_floor: positive(&var, "CALORIE_FLOOR").unwrap_or(defaults.calorie_floor),
                meal_split,
            },
        }
    }
}

fn parsed<F, T>(var: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = var(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn positive<F>(var: &F, name: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    parsed::<F, f64>(var, name).filter(|value| {
        let ok = value.is_finite() && *value > 0.0;
        if !ok {
            warn!(variable = name, value, "setting must be positive; using default");
        }
        ok
    })
}

fn parse_meal_split(raw: &str) -> Option<MealSplit> {
    let parts: Vec<u8> = raw
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [breakfast, lunch, dinner, snack] => {
            MealSplit::from_percentages(*breakfast, *lunch, *dinner, *snack)
        }
        _ => None,
    }
}
