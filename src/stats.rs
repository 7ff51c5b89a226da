use crate::accounting::{self, AccountingParams};
use crate::models::{ChartSlices, DailySummary, MealType};
use crate::session::{Session, SessionError};

pub fn build_summary(
    params: &AccountingParams,
    session: &Session,
) -> Result<DailySummary, SessionError> {
    let profile = *session.profile()?;
    let target = accounting::daily_target(params, profile.current_weight_kg, profile.goal)?;
    let distribution = accounting::meal_distribution(&params.meal_split, target);

    let consumed = accounting::consumed(&session.foods);
    let burned = accounting::burned(&session.activities);

    let meals = MealType::ALL
        .iter()
        .map(|meal| accounting::meal_progress(*meal, &distribution, &session.foods))
        .collect();

    Ok(DailySummary {
        profile,
        target,
        consumed,
        burned,
        remaining: accounting::remaining(target, consumed, burned),
        distribution,
        meals,
        chart: ChartSlices {
            consumed,
            burned,
            remaining: accounting::chart_remaining(target, consumed, burned),
        },
        water_cups: session.water_cups(),
        food_count: session.foods.len(),
        activity_count: session.activities.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::ActivityKind;
    use crate::models::{FoodEntry, Goal, UserProfile};
    use crate::session::Action;
    use chrono::Utc;

    fn session_with_profile() -> Session {
        let mut session = Session::new("owner-1");
        session
            .apply(Action::SubmitProfile(UserProfile {
                current_weight_kg: 70.0,
                target_weight_kg: 65.0,
                goal: Goal::Lose,
            }))
            .unwrap();
        session
    }

    fn food(id: &str, calories: f64, meal_type: MealType) -> FoodEntry {
        FoodEntry {
            id: id.into(),
            owner_id: "owner-1".into(),
            name: "rice".into(),
            calories,
            amount: 100.0,
            unit: "gram".into(),
            category: "solid".into(),
            meal_type: Some(meal_type),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_requires_profile() {
        let session = Session::new("owner-1");
        assert_eq!(
            build_summary(&AccountingParams::default(), &session).err(),
            Some(SessionError::ProfileRequired)
        );
    }

    #[test]
    fn summary_totals_foods_and_activities() {
        let mut session = session_with_profile();
        session
            .apply(Action::AddFood(food("a", 500.0, MealType::Breakfast)))
            .unwrap();
        session
            .apply(Action::AddFood(food("b", 650.0, MealType::Lunch)))
            .unwrap();
        session
            .apply(Action::AddActivity {
                id: "run".into(),
                kind: ActivityKind::Running,
                duration_minutes: 30,
                at: Utc::now(),
            })
            .unwrap();

        let summary = build_summary(&AccountingParams::default(), &session).unwrap();
        assert_eq!(summary.target, 1600.0);
        assert_eq!(summary.consumed, 1150.0);
        assert_eq!(summary.burned, 294.0);
        assert_eq!(summary.remaining, 744.0);
        assert_eq!(summary.meals.len(), 4);
        assert_eq!(summary.meals[0].target, 480.0);
        assert_eq!(summary.meals[0].remaining, -20.0);
        assert_eq!(summary.food_count, 2);
        assert_eq!(summary.activity_count, 1);
    }

    #[test]
    fn over_budget_remaining_is_negative_but_chart_is_clamped() {
        let mut session = session_with_profile();
        session
            .apply(Action::AddFood(food("feast", 2400.0, MealType::Dinner)))
            .unwrap();

        let summary = build_summary(&AccountingParams::default(), &session).unwrap();
        assert_eq!(summary.remaining, -800.0);
        assert_eq!(summary.chart.remaining, 0.0);
        assert_eq!(summary.chart.consumed, 2400.0);
    }
}
