//! Month grid for the cycle calendar.
//!
//! Cycles without an end date are drawn as a five day period starting on
//! their start date. That window exists only here and is never stored.

use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{parse_date, Cycle};
use crate::store::TrackerStore;

/// Days added to an open cycle's start to get its display end date.
pub const ASSUMED_PERIOD_EXTRA_DAYS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
}

impl MonthView {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::containing)
            .ok_or_else(|| AppError::validation(format!("Invalid month {}-{}", year, month)))
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        match first.checked_add_months(Months::new(1)) {
            Some(next) => (next - first).num_days() as u32,
            None => 31,
        }
    }

    pub fn prev(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map(Self::containing)
            .unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map(Self::containing)
            .unwrap_or(*self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub in_period: bool,
    pub has_symptom: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub view: MonthView,
    pub prev: MonthView,
    pub next: MonthView,
    /// Sunday-first week. `None` cells pad the first week.
    pub cells: Vec<Option<DayCell>>,
}

impl MonthGrid {
    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.cells.iter().flatten().find(|c| c.day == day)
    }

    pub fn leading_blanks(&self) -> usize {
        self.cells.iter().take_while(|c| c.is_none()).count()
    }
}

/// Last day drawn as part of a cycle's period.
pub fn effective_end(cycle: &Cycle) -> NaiveDate {
    cycle.end_date.unwrap_or_else(|| {
        cycle
            .start_date
            .checked_add_signed(Duration::days(ASSUMED_PERIOD_EXTRA_DAYS))
            .unwrap_or(NaiveDate::MAX)
    })
}

pub fn in_period(cycles: &[Cycle], date: NaiveDate) -> bool {
    cycles
        .iter()
        .any(|c| c.start_date <= date && date <= effective_end(c))
}

pub fn build_month<I>(view: MonthView, cycles: &[Cycle], symptom_dates: I, today: NaiveDate) -> MonthGrid
where
    I: IntoIterator<Item = NaiveDate>,
{
    let symptom_dates: HashSet<NaiveDate> = symptom_dates.into_iter().collect();
    let first = view.first_day();
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<DayCell>> = vec![None; leading];
    for date in first.iter_days().take(view.days_in_month() as usize) {
        cells.push(Some(DayCell {
            date,
            day: date.day(),
            in_period: in_period(cycles, date),
            has_symptom: symptom_dates.contains(&date),
            is_today: date == today,
        }));
    }

    MonthGrid {
        view,
        prev: view.prev(),
        next: view.next(),
        cells,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// The viewer's local date; defaults to the server's local date.
    pub today: Option<String>,
}

pub async fn month_calendar(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    query: CalendarQuery,
) -> Result<MonthGrid, AppError> {
    let user = session.require().await?;

    let today = match query.today.as_deref() {
        Some(raw) => parse_date("today", Some(raw))?,
        None => Local::now().date_naive(),
    };
    let view = match (query.year, query.month) {
        (Some(year), Some(month)) => MonthView::new(year, month)?,
        (None, None) => MonthView::containing(today),
        _ => return Err(AppError::validation("Both year and month are required")),
    };

    let cycles = store.list_cycles(user.id).await?;
    let symptoms = store.list_symptoms(user.id).await?;

    Ok(build_month(
        view,
        &cycles,
        symptoms.iter().map(|s| s.date),
        today,
    ))
}
