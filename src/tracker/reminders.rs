use serde::Deserialize;

use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{non_blank, parse_date, parse_id, Deleted, NewReminder, Reminder};
use crate::store::TrackerStore;

pub const DEFAULT_REMINDER_TYPE: &str = "custom";

#[derive(Debug, Default, Deserialize)]
pub struct ReminderForm {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub reminder_type: Option<String>,
}

pub async fn add_reminder(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: ReminderForm,
) -> Result<Reminder, AppError> {
    let user = session.require().await?;
    let title = form.title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(AppError::validation("Please enter a reminder title"));
    }
    let date = parse_date("date", form.date.as_deref())?;

    store
        .insert_reminder(NewReminder {
            user_id: user.id,
            title,
            date,
            reminder_type: non_blank(form.reminder_type)
                .unwrap_or_else(|| DEFAULT_REMINDER_TYPE.to_string()),
        })
        .await
}

pub async fn delete_reminder(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    reminder_id: &str,
) -> Result<Deleted, AppError> {
    let user = session.require().await?;
    let reminder_id = parse_id("id", reminder_id)?;
    let deleted = store.delete_reminder(user.id, reminder_id).await?;
    Ok(Deleted { deleted })
}

/// The caller's reminders, soonest first.
pub async fn list_reminders(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<Reminder>, AppError> {
    let user = session.require().await?;
    store.list_reminders(user.id).await
}
