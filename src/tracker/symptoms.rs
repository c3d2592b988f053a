use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use super::cycles::cycle_id_for_entry;
use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{parse_date, NewSymptom, Severity, SymptomEntry, SymptomsByDate};
use crate::store::TrackerStore;

#[derive(Debug, Default, Deserialize)]
pub struct SymptomForm {
    pub date: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub severity: Option<String>,
}

/// Logs one row per selected symptom type, all sharing the date, severity
/// and the cycle found for that date.
pub async fn log_symptoms(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: SymptomForm,
) -> Result<Vec<SymptomEntry>, AppError> {
    let user = session.require().await?;

    let types: Vec<String> = form
        .symptoms
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if types.is_empty() {
        return Err(AppError::validation("Please select at least one symptom"));
    }

    let date = parse_date("date", form.date.as_deref())?;
    let severity = Severity::parse(form.severity.as_deref())?;
    let cycle_id = cycle_id_for_entry(store, user.id, date).await;

    let rows = types
        .into_iter()
        .map(|symptom_type| NewSymptom {
            user_id: user.id,
            cycle_id,
            date,
            symptom_type,
            severity,
        })
        .collect();

    let inserted = store.insert_symptoms(rows).await?;
    tracing::info!("📝 {} symptom(s) logged on {} for {}", inserted.len(), date, user.id);
    Ok(inserted)
}

pub async fn list_symptoms(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<SymptomEntry>, AppError> {
    let user = session.require().await?;
    store.list_symptoms(user.id).await
}

/// Symptom types per date, newest date first.
pub async fn symptoms_by_date(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<SymptomsByDate>, AppError> {
    let user = session.require().await?;
    let rows = store.list_symptoms(user.id).await?;

    let mut map = BTreeMap::<NaiveDate, Vec<String>>::new();
    for row in rows {
        map.entry(row.date)
            .or_default()
            .push(row.symptom_type);
    }

    Ok(map
        .into_iter()
        .rev()
        .map(|(date, symptoms)| SymptomsByDate { date, symptoms })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, MemoryAuthService};
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use uuid::Uuid;

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

    fn form(date: &str, symptoms: &[&str], severity: Option<&str>) -> SymptomForm {
        SymptomForm {
            date: Some(date.into()),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            severity: severity.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn batch_is_tagged_with_containing_cycle() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        let cycle = store.seed_cycle(user_id, day(2024, 1, 1), None, None);

        let rows = log_symptoms(&store, &session, form("2024-01-03", &["cramps", "nausea"], Some("severe")))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.cycle_id == Some(cycle.id)));
        assert!(rows.iter().all(|r| r.severity == Severity::Severe));
        let types: Vec<&str> = rows.iter().map(|r| r.symptom_type.as_str()).collect();
        assert_eq!(types, ["cramps", "nausea"]);
    }

    #[tokio::test]
    async fn batch_outside_any_cycle_is_unassociated() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;
        store.seed_cycle(user_id, day(2024, 1, 1), Some(day(2024, 1, 4)), None);

        let rows = log_symptoms(&store, &session, form("2024-01-20", &["headache"], None))
            .await
            .unwrap();
        assert_eq!(rows[0].cycle_id, None);
        assert_eq!(rows[0].severity, Severity::Moderate);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let store = MemoryStore::new();
        let (session, user_id) = signed_in().await;

        let err = log_symptoms(&store, &session, form("2024-01-03", &[" "], None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one symptom");
        assert!(store.list_symptoms(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grouped_view_is_newest_first() {
        let store = MemoryStore::new();
        let (session, _) = signed_in().await;
        log_symptoms(&store, &session, form("2024-01-03", &["cramps", "bloating"], None))
            .await
            .unwrap();
        log_symptoms(&store, &session, form("2024-01-05", &["fatigue"], None))
            .await
            .unwrap();

        let grouped = symptoms_by_date(&store, &session).await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].date, day(2024, 1, 5));
        assert_eq!(grouped[1].symptoms, vec!["cramps", "bloating"]);
    }
}
