use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{parse_date, non_blank, Cycle, CycleClose, NewCycle, NewReminder};
use crate::store::TrackerStore;

/// Days after a cycle start at which the next period is predicted.
pub const PREDICTION_OFFSET_DAYS: i64 = 28;
pub const PREDICTION_TITLE: &str = "Period expected";
pub const CYCLE_REMINDER_TYPE: &str = "cycle";
pub const NO_ACTIVE_CYCLE: &str = "No active cycle found";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStartForm {
    pub start_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEndForm {
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

/// Opens a new cycle, then makes a best-effort attempt to schedule the
/// "Period expected" reminder. A failed reminder never fails the start.
pub async fn start_cycle(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: CycleStartForm,
) -> Result<Cycle, AppError> {
    let user = session.require().await?;
    let start_date = parse_date("startDate", form.start_date.as_deref())?;

    let cycle = store
        .insert_cycle(NewCycle {
            user_id: user.id,
            start_date,
            notes: non_blank(form.notes),
        })
        .await?;

    tracing::info!("🩸 cycle {} started on {} for {}", cycle.id, start_date, user.id);

    match start_date.checked_add_signed(Duration::days(PREDICTION_OFFSET_DAYS)) {
        Some(expected) => {
            let reminder = NewReminder {
                user_id: user.id,
                title: PREDICTION_TITLE.to_string(),
                date: expected,
                reminder_type: CYCLE_REMINDER_TYPE.to_string(),
            };
            if let Err(e) = store.insert_reminder(reminder).await {
                tracing::warn!(user_id = %user.id, error = %e, "failed to create reminder");
            }
        }
        None => tracing::warn!("no prediction date after {}", start_date),
    }

    Ok(cycle)
}

/// Closes the most recently started open cycle.
pub async fn end_cycle(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: CycleEndForm,
) -> Result<Cycle, AppError> {
    let user = session.require().await?;
    let end_date = parse_date("endDate", form.end_date.as_deref())?;

    let Some(open) = store.latest_open_cycle(user.id).await? else {
        return Err(AppError::NotFound(NO_ACTIVE_CYCLE.into()));
    };

    let close = CycleClose {
        end_date,
        notes: append_note(open.notes.as_deref(), form.notes.as_deref()),
        updated_at: Utc::now(),
    };

    // None here means another request closed it first.
    let closed = store
        .close_cycle(open.id, close)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_CYCLE.into()))?;

    tracing::info!("🩸 cycle {} ended on {} for {}", closed.id, end_date, user.id);
    Ok(closed)
}

pub async fn list_cycles(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<Cycle>, AppError> {
    let user = session.require().await?;
    store.list_cycles(user.id).await
}

pub async fn find_cycle_for_date(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    date: Option<&str>,
) -> Result<Option<Cycle>, AppError> {
    let user = session.require().await?;
    let date = parse_date("date", date)?;
    store.find_cycle_for_date(user.id, date).await
}

/// Cycle id to stamp on an entry logged for `date`. Lookup failures leave the
/// entry unassociated instead of blocking it.
pub(crate) async fn cycle_id_for_entry(
    store: &dyn TrackerStore,
    user_id: Uuid,
    date: NaiveDate,
) -> Option<Uuid> {
    match store.find_cycle_for_date(user_id, date).await {
        Ok(cycle) => cycle.map(|c| c.id),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "cycle lookup failed");
            None
        }
    }
}

/// Appends `addition` on a new line. Blank existing notes are replaced.
pub fn append_note(existing: Option<&str>, addition: Option<&str>) -> Option<String> {
    let addition = addition.map(str::trim).filter(|a| !a.is_empty());
    let existing = existing.filter(|e| !e.is_empty());

    match (existing, addition) {
        (Some(e), Some(a)) => Some(format!("{}\n{}", e, a)),
        (None, Some(a)) => Some(a.to_string()),
        (e, None) => e.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, MemoryAuthService};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn signed_in() -> (SessionResolver, Uuid) {
        let auth = Arc::new(MemoryAuthService::new());
        let user = auth.sign_up("ada@example.com", "pw-123456").await.unwrap();
        let session = auth
            .sign_in_with_password("ada@example.com", "pw-123456")
            .await
            .unwrap();
        (SessionResolver::new(auth, Some(session.access_token)), user.id)
    }

    fn anonymous() -> SessionResolver {
        SessionResolver::new(Arc::new(MemoryAuthService::new()), None)
    }

    fn start_form(date: &str) -> CycleStartForm {
        CycleStartForm {
            start_date: Some(date.into()),
            notes: None,
        }
    }

    fn end_form(date: &str, notes: Option<&str>) -> CycleEndForm {
        CycleEndForm {
            end_date: Some(date.into()),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn append_note_joins_with_newline() {
        assert_eq!(append_note(Some("a"), Some("b")), Some("a\nb".into()));
        assert_eq!(append_note(Some(""), Some("b")), Some("b".into()));
        assert_eq!(append_note(None, Some("b")), Some("b".into()));
        assert_eq!(append_note(Some("a"), Some("  ")), Some("a".into()));
        assert_eq!(append_note(None, None), None);
    }

    #[tokio::test]
    async fn start_cycle_schedules_prediction() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;

        let cycle = start_cycle(&store, &session, start_form("2024-01-01"))
            .await
            .unwrap();
        assert_eq!(cycle.start_date, day(2024, 1, 1));
        assert!(cycle.is_open());

        let reminders = store.list_reminders(user_id).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].date, day(2024, 1, 29));
        assert_eq!(reminders[0].title, PREDICTION_TITLE);
        assert_eq!(reminders[0].reminder_type, CYCLE_REMINDER_TYPE);
    }

    #[tokio::test]
    async fn start_cycle_survives_reminder_failure() {
        let store = MemoryStore::new();
        store.fail_reminder_inserts(true);
        let (session, user_id) = signed_in().await;

        let cycle = start_cycle(&store, &session, start_form("2024-01-01")).await;
        assert!(cycle.is_ok());
        assert_eq!(store.list_cycles(user_id).await.unwrap().len(), 1);
        assert!(store.list_reminders(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_cycle_surfaces_insert_failure() {
        let store = MemoryStore::new();
        store.fail_next_write();
        let (session, user_id) = signed_in().await;

        let err = start_cycle(&store, &session, start_form("2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(store.list_reminders(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_cycle_requires_valid_date() {
        let store = MemoryStore::new();
        let (session, _) = signed_in().await;

        let err = start_cycle(&store, &session, CycleStartForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = start_cycle(&store, &session, start_form("yesterday"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn anonymous_callers_are_rejected_before_validation() {
        let store = MemoryStore::new();
        let err = start_cycle(&store, &anonymous(), CycleStartForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));

        let err = end_cycle(&store, &anonymous(), CycleEndForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn end_cycle_without_open_cycle_is_not_found() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        store.seed_cycle(user_id, day(2024, 1, 1), Some(day(2024, 1, 5)), None);

        let err = end_cycle(&store, &session, end_form("2024-02-05", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == NO_ACTIVE_CYCLE));
    }

    #[tokio::test]
    async fn end_cycle_closes_only_the_open_cycle() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        let closed = store.seed_cycle(user_id, day(2024, 1, 1), Some(day(2024, 1, 5)), Some("old"));
        let open = store.seed_cycle(user_id, day(2024, 2, 1), None, Some("a"));

        let ended = end_cycle(&store, &session, end_form("2024-02-06", Some("b")))
            .await
            .unwrap();
        assert_eq!(ended.id, open.id);
        assert_eq!(ended.end_date, Some(day(2024, 2, 6)));
        assert_eq!(ended.notes.as_deref(), Some("a\nb"));
        assert!(ended.updated_at >= open.updated_at);

        assert_eq!(store.cycle(closed.id), Some(closed));
    }

    #[tokio::test]
    async fn end_cycle_replaces_empty_notes() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        store.seed_cycle(user_id, day(2024, 2, 1), None, Some(""));

        let ended = end_cycle(&store, &session, end_form("2024-02-05", Some("b")))
            .await
            .unwrap();
        assert_eq!(ended.notes.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn end_cycle_ignores_other_users_cycles() {
        let store = MemoryStore::new();
        let (session, _) = signed_in().await;
        store.seed_cycle(Uuid::new_v4(), day(2024, 2, 1), None, None);

        let err = end_cycle(&store, &session, end_form("2024-02-05", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn locate_uses_inclusive_end_date() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        let cycle = store.seed_cycle(user_id, day(2024, 3, 1), Some(day(2024, 3, 5)), None);

        let found = find_cycle_for_date(&store, &session, Some("2024-03-05"))
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(cycle.id));

        let found = find_cycle_for_date(&store, &session, Some("2024-03-06"))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
