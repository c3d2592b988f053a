use serde::Deserialize;

use super::cycles::cycle_id_for_entry;
use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{non_blank, parse_date, MoodEntry, NewMood};
use crate::store::TrackerStore;

#[derive(Debug, Default, Deserialize)]
pub struct MoodForm {
    pub date: Option<String>,
    pub mood: Option<String>,
    pub notes: Option<String>,
}

pub async fn log_mood(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: MoodForm,
) -> Result<MoodEntry, AppError> {
    let user = session.require().await?;
    let mood = non_blank(form.mood).ok_or_else(|| AppError::validation("Please select a mood"))?;
    let date = parse_date("date", form.date.as_deref())?;
    let cycle_id = cycle_id_for_entry(store, user.id, date).await;

    store
        .insert_mood(NewMood {
            user_id: user.id,
            cycle_id,
            date,
            mood,
            notes: non_blank(form.notes),
        })
        .await
}

pub async fn list_moods(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<MoodEntry>, AppError> {
    let user = session.require().await?;
    store.list_moods(user.id).await
}
