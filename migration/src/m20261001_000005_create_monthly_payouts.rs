use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(MonthlyPayouts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(MonthlyPayouts::Month)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(MonthlyPayouts::RangeStart).date_time().not_null(),
          )
          .col(ColumnDef::new(MonthlyPayouts::RangeEnd).date_time().not_null())
          .col(ColumnDef::new(MonthlyPayouts::ByAgent).json().not_null())
          .col(
            ColumnDef::new(MonthlyPayouts::CreatedAt).date_time().not_null(),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(MonthlyPayouts::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum MonthlyPayouts {
  Table,
  Month,
  RangeStart,
  RangeEnd,
  ByAgent,
  CreatedAt,
}
