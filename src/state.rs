use crate::accounting::AccountingParams;
use crate::errors::AppError;
use crate::lookup::NutritionLookup;
use crate::models::AppData;
use crate::session::{Action, Session, Transition};
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub lookup: Arc<NutritionLookup>,
    pub accounting: AccountingParams,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        data: AppData,
        lookup: NutritionLookup,
        accounting: AccountingParams,
    ) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            lookup: Arc::new(lookup),
            accounting,
        }
    }

    /// Applies one action to the owner's session and writes the data file if
    /// the session changed. Returns the session as it stands afterwards.
    /// Owners only enter the document through a change that was persisted.
    pub async fn dispatch(&self, owner: &str, action: Action) -> Result<Session, AppError> {
        let mut data = self.data.lock().await;
        let previous = data.owners.get(owner).cloned();

        let mut next = previous.clone().unwrap_or_else(|| Session::new(owner));
        if next.apply(action)? == Transition::Unchanged {
            return Ok(next);
        }

        data.owners.insert(owner.to_string(), next.clone());
        if let Err(err) = persist_data(&self.data_path, &data).await {
            match previous {
                Some(previous) => data.owners.insert(owner.to_string(), previous),
                None => data.owners.remove(owner),
            };
            return Err(err);
        }
        info!(%owner, "session updated");
        Ok(next)
    }

    /// Snapshot of the owner's session; owners never seen get an empty one.
    pub async fn session(&self, owner: &str) -> Session {
        let data = self.data.lock().await;
        data.owners
            .get(owner)
            .cloned()
            .unwrap_or_else(|| Session::new(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{
        CredentialPool, IngredientHit, IngredientInformation, LookupError, NutritionSource,
    };
    use crate::models::FoodEntry;
    use crate::storage::{load_data, prepare_data_dir};
    use async_trait::async_trait;
    use chrono::Utc;

    struct Offline;

    #[async_trait]
    impl NutritionSource for Offline {
        async fn search(
            &self,
            _api_key: &str,
            _query: &str,
            _number: u8,
        ) -> Result<Vec<IngredientHit>, LookupError> {
            Err(LookupError::NoCredentials)
        }

        async fn information(
            &self,
            _api_key: &str,
            _ingredient_id: i64,
            _amount: f64,
            _unit: &str,
        ) -> Result<IngredientInformation, LookupError> {
            Err(LookupError::NoCredentials)
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir()
            .join(format!("farfit_state_{label}_{}_{nanos}", std::process::id()))
            .join("state.json")
    }

    fn app_state(data_path: PathBuf) -> AppState {
        let lookup = NutritionLookup::new(
            Arc::new(Offline),
            CredentialPool::new(Vec::<String>::new()),
            "https://img.test",
        );
        AppState::new(data_path, AppData::default(), lookup, AccountingParams::default())
    }

    fn add_food(id: &str, owner: &str) -> Action {
        Action::AddFood(FoodEntry {
            id: id.into(),
            owner_id: owner.into(),
            name: "toast".into(),
            calories: 90.0,
            amount: 1.0,
            unit: "piece".into(),
            category: "breakfast".into(),
            meal_type: None,
            image: None,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn unchanged_or_rejected_actions_do_not_register_owners() {
        let path = temp_path("owners");
        prepare_data_dir(&path).await.unwrap();
        let state = app_state(path.clone());

        for i in 0..3 {
            let owner = format!("stranger-{i}");
            state
                .dispatch(&owner, Action::RemoveFood("nope".into()))
                .await
                .unwrap();
        }
        let mut blank = add_food("blank", "stranger-3");
        if let Action::AddFood(food) = &mut blank {
            food.name = " ".into();
        }
        assert!(state.dispatch("stranger-3", blank).await.is_err());

        state
            .dispatch("real", Action::SetWater { cups: 2, at: Utc::now() })
            .await
            .unwrap();

        let persisted: Vec<String> = load_data(&path).await.owners.into_keys().collect();
        assert_eq!(persisted, vec!["real".to_string()]);
        assert_eq!(state.data.lock().await.owners.len(), 1);
    }

    #[tokio::test]
    async fn failed_write_restores_previous_session() {
        let path = temp_path("rollback");
        prepare_data_dir(&path).await.unwrap();
        let state = app_state(path);
        state.dispatch("owner-1", add_food("a", "owner-1")).await.unwrap();

        // Same shared data, but a data file inside a directory that is never created.
        let broken = AppState {
            data_path: temp_path("missing").join("nested").join("state.json"),
            ..state.clone()
        };
        assert!(broken.dispatch("owner-1", add_food("b", "owner-1")).await.is_err());
        assert!(broken.dispatch("owner-2", add_food("c", "owner-2")).await.is_err());

        let ids: Vec<String> = state
            .session("owner-1")
            .await
            .foods
            .into_iter()
            .map(|food| food.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
        assert!(state.session("owner-2").await.foods.is_empty());
        assert!(!state.data.lock().await.owners.contains_key("owner-2"));
    }
}
