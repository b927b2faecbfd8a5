use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use serde::Serialize;

use crate::{
  entity::{AgentTotals, ByAgent, CommissionStatus, commission, monthly_payout},
  prelude::*,
  sv::Commission,
  utils,
};

/// A calendar month in UTC. Both bounds are inclusive, `end` being the last
/// millisecond of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
  pub start: DateTime,
  pub end: DateTime,
}

impl MonthRange {
  pub fn month(year: i32, month: u32) -> Result<Self> {
    let first = |y, m| {
      NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    };

    let invalid =
      || Error::InvalidArgs(format!("no such month {year}-{month:02}"));

    let (next_year, next_month) = if month == 12 {
      (year.checked_add(1).ok_or_else(invalid)?, 1)
    } else {
      (year, month + 1)
    };

    match (first(year, month), first(next_year, next_month)) {
      (Some(start), Some(next)) => {
        Ok(Self { start, end: next - TimeDelta::milliseconds(1) })
      }
      _ => Err(invalid()),
    }
  }

  /// Parses a `YYYY-MM` key.
  pub fn parse(key: &str) -> Result<Self> {
    let invalid = || Error::InvalidArgs(format!("bad month key `{key}`"));

    let (year, month) = key.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
      return Err(invalid());
    }

    let year = year.parse().map_err(|_| invalid())?;
    let month = month.parse().map_err(|_| invalid())?;
    Self::month(year, month)
  }

  pub fn containing(at: DateTime) -> Result<Self> {
    Self::month(at.year(), at.month())
  }

  /// The calendar month before the one `now` falls in.
  pub fn previous(now: DateTime) -> Result<Self> {
    let current = Self::containing(now)?;
    Self::containing(current.start - TimeDelta::milliseconds(1))
  }

  pub fn next_start(&self) -> DateTime {
    self.end + TimeDelta::milliseconds(1)
  }

  pub fn key(&self) -> String {
    self.start.format("%Y-%m").to_string()
  }
}

/// Groups commissions per agent, splitting amounts by payment status.
pub fn aggregate(commissions: &[commission::Model]) -> ByAgent {
  let mut by_agent: BTreeMap<String, AgentTotals> = BTreeMap::new();

  for c in commissions {
    let totals = by_agent.entry(c.agent_id.clone()).or_default();
    match c.commission_status {
      CommissionStatus::Paid => totals.paid += c.amount,
      CommissionStatus::Unpaid => totals.unpaid += c.amount,
    }
    totals.ids.push(c.id.clone());
  }

  ByAgent(by_agent)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  pub month: String,
  pub range: MonthRange,
  pub by_agent: ByAgent,
  pub created_at: DateTime,
}

impl From<monthly_payout::Model> for Snapshot {
  fn from(model: monthly_payout::Model) -> Self {
    Self {
      month: model.month,
      range: MonthRange { start: model.range_start, end: model.range_end },
      by_agent: model.by_agent,
      created_at: model.created_at,
    }
  }
}

pub struct Payout<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Payout<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Recomputes and stores the snapshot for `range`, replacing any earlier
  /// one for the same month.
  pub async fn snapshot(&self, range: MonthRange) -> Result<Snapshot> {
    use monthly_payout::Column;

    let commissions = Commission::new(self.db).in_range(&range).await?;
    let by_agent = aggregate(&commissions);
    let key = range.key();

    info!(
      "snapshot {key}: {} commission(s) across {} agent(s)",
      commissions.len(),
      by_agent.0.len()
    );

    let model = monthly_payout::ActiveModel {
      month: Set(key.clone()),
      range_start: Set(range.start),
      range_end: Set(range.end),
      by_agent: Set(by_agent),
      created_at: Set(utils::now()),
    };

    monthly_payout::Entity::insert(model)
      .on_conflict(
        OnConflict::column(Column::Month)
          .update_columns([
            Column::RangeStart,
            Column::RangeEnd,
            Column::ByAgent,
            Column::CreatedAt,
          ])
          .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    self.by_month(&key).await?.ok_or(Error::SnapshotNotFound)
  }

  pub async fn snapshot_previous_month(
    &self,
    now: DateTime,
  ) -> Result<Snapshot> {
    self.snapshot(MonthRange::previous(now)?).await
  }

  pub async fn by_month(&self, key: &str) -> Result<Option<Snapshot>> {
    Ok(
      monthly_payout::Entity::find_by_id(key)
        .one(self.db)
        .await?
        .map(Snapshot::from),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
  }

  async fn insert(
    db: &DatabaseConnection,
    id: &str,
    agent: &str,
    amount: i64,
    status: CommissionStatus,
    created_at: DateTime,
  ) {
    commission::ActiveModel {
      id: Set(id.into()),
      agent_id: Set(agent.into()),
      promocode_id: Set("pc_1".into()),
      subscription_id: Set(format!("sub_{id}")),
      commission_status: Set(status),
      amount: Set(amount),
      currency: Set("USD".into()),
      created_at: Set(created_at),
      updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .unwrap();
  }

  #[test]
  fn test_month_range_bounds() {
    let feb = MonthRange::month(2024, 2).unwrap();
    assert_eq!(feb.start, at(2024, 2, 1, 0, 0, 0));
    let last_ms = at(2024, 2, 29, 23, 59, 59) + TimeDelta::milliseconds(999);
    assert_eq!(feb.end, last_ms);
    assert_eq!(feb.next_start(), at(2024, 3, 1, 0, 0, 0));
    assert_eq!(feb.key(), "2024-02");

    let dec = MonthRange::month(2025, 12).unwrap();
    assert_eq!(dec.next_start(), at(2026, 1, 1, 0, 0, 0));

    assert!(MonthRange::month(2025, 13).is_err());
    assert!(MonthRange::month(2025, 0).is_err());
  }

  #[test]
  fn test_previous_month_wraps_year() {
    let prev = MonthRange::previous(at(2026, 1, 1, 0, 5, 0)).unwrap();
    assert_eq!(prev.key(), "2025-12");

    let prev = MonthRange::previous(at(2026, 10, 16, 9, 30, 0)).unwrap();
    assert_eq!(prev.key(), "2026-09");
    assert_eq!(prev.start, at(2026, 9, 1, 0, 0, 0));
  }

  #[test]
  fn test_parse_month_key() {
    assert_eq!(MonthRange::parse("2026-03").unwrap().key(), "2026-03");
    assert!(MonthRange::parse("2026-3").is_err());
    assert!(MonthRange::parse("2026-13").is_err());
    assert!(MonthRange::parse("march").is_err());
  }

  #[test]
  fn test_month_range_rejects_out_of_range_years() {
    assert!(MonthRange::month(i32::MAX, 12).is_err());
    assert!(MonthRange::month(i32::MAX, 13).is_err());
    assert!(MonthRange::parse("9999-12").is_ok());
  }

  #[tokio::test]
  async fn test_snapshot_groups_by_agent_within_window() {
    let db = test_db::setup().await;
    use CommissionStatus::*;

    insert(&db, "cm_1", "ag_1", 19_80, Unpaid, at(2026, 3, 1, 0, 0, 0)).await;
    insert(&db, "cm_2", "ag_1", 9_80, Paid, at(2026, 3, 15, 8, 0, 0)).await;
    insert(&db, "cm_3", "ag_1", 39_80, Unpaid, at(2026, 3, 31, 23, 59, 59))
      .await;
    insert(&db, "cm_4", "ag_2", 9_80, Paid, at(2026, 3, 10, 10, 0, 0)).await;
    // outside the window
    insert(&db, "cm_5", "ag_1", 19_80, Unpaid, at(2026, 2, 28, 23, 59, 59))
      .await;
    insert(&db, "cm_6", "ag_2", 19_80, Unpaid, at(2026, 4, 1, 0, 0, 0)).await;

    let snapshot = Payout::new(&db)
      .snapshot_previous_month(at(2026, 4, 1, 0, 5, 0))
      .await
      .unwrap();

    assert_eq!(snapshot.month, "2026-03");
    assert_eq!(snapshot.by_agent.0.len(), 2);

    let alice = &snapshot.by_agent.0["ag_1"];
    assert_eq!(alice.unpaid, 19_80 + 39_80);
    assert_eq!(alice.paid, 9_80);
    assert_eq!(alice.ids, vec!["cm_1", "cm_2", "cm_3"]);

    let bob = &snapshot.by_agent.0["ag_2"];
    assert_eq!(
      bob,
      &AgentTotals { unpaid: 0, paid: 9_80, ids: vec!["cm_4".into()] }
    );
  }

  #[tokio::test]
  async fn test_snapshot_rerun_is_idempotent() {
    let db = test_db::setup().await;
    use CommissionStatus::*;

    insert(&db, "cm_1", "ag_1", 19_80, Unpaid, at(2026, 3, 2, 0, 0, 0)).await;
    insert(&db, "cm_2", "ag_2", 9_80, Paid, at(2026, 3, 3, 0, 0, 0)).await;

    let sv = Payout::new(&db);
    let range = MonthRange::month(2026, 3).unwrap();
    let first = sv.snapshot(range).await.unwrap();
    let second = sv.snapshot(range).await.unwrap();

    assert_eq!(first.range, second.range);
    assert_eq!(
      json::to_vec(&first.by_agent).unwrap(),
      json::to_vec(&second.by_agent).unwrap()
    );
    assert_eq!(monthly_payout::Entity::find().all(&db).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_snapshot_reflects_changes_on_rerun() {
    let db = test_db::setup().await;

    let march = at(2026, 3, 2, 0, 0, 0);
    insert(&db, "cm_1", "ag_1", 19_80, CommissionStatus::Unpaid, march).await;

    let sv = Payout::new(&db);
    let range = MonthRange::month(2026, 3).unwrap();
    sv.snapshot(range).await.unwrap();

    Commission::new(&db).mark_paid(&["cm_1".into()]).await.unwrap();
    let snapshot = sv.snapshot(range).await.unwrap();

    let totals = &snapshot.by_agent.0["ag_1"];
    assert_eq!((totals.unpaid, totals.paid), (0, 19_80));
  }

  #[tokio::test]
  async fn test_empty_month_snapshot() {
    let db = test_db::setup().await;

    let snapshot = Payout::new(&db)
      .snapshot(MonthRange::month(2026, 1).unwrap())
      .await
      .unwrap();

    assert!(snapshot.by_agent.0.is_empty());
    assert!(Payout::new(&db).by_month("2026-01").await.unwrap().is_some());
    assert!(Payout::new(&db).by_month("2026-02").await.unwrap().is_none());
  }
}
