use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Subscriptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Subscriptions::Id)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Subscriptions::PrimaryEmail).string().not_null())
          .col(ColumnDef::new(Subscriptions::PlanType).string().not_null())
          .col(ColumnDef::new(Subscriptions::PromocodeId).string().null())
          .col(
            ColumnDef::new(Subscriptions::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(ColumnDef::new(Subscriptions::StartDate).date_time().not_null())
          .col(ColumnDef::new(Subscriptions::EndDate).date_time().null())
          .col(ColumnDef::new(Subscriptions::PaymentMethod).string().null())
          .col(ColumnDef::new(Subscriptions::TransactionRecord).string().null())
          .col(ColumnDef::new(Subscriptions::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Subscriptions::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_subscriptions_promocode")
          .table(Subscriptions::Table)
          .col(Subscriptions::PromocodeId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Subscriptions {
  Table,
  Id,
  PrimaryEmail,
  PlanType,
  PromocodeId,
  Status,
  StartDate,
  EndDate,
  PaymentMethod,
  TransactionRecord,
  CreatedAt,
  UpdatedAt,
}
