use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Commissions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Commissions::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(Commissions::AgentId).string().not_null())
          .col(ColumnDef::new(Commissions::PromocodeId).string().not_null())
          .col(
            ColumnDef::new(Commissions::SubscriptionId)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(
            ColumnDef::new(Commissions::CommissionStatus)
              .string()
              .not_null()
              .default("unpaid"),
          )
          .col(ColumnDef::new(Commissions::Amount).big_integer().not_null())
          .col(
            ColumnDef::new(Commissions::Currency)
              .string()
              .not_null()
              .default("USD"),
          )
          .col(ColumnDef::new(Commissions::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Commissions::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commissions_created_at")
          .table(Commissions::Table)
          .col(Commissions::CreatedAt)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commissions_agent")
          .table(Commissions::Table)
          .col(Commissions::AgentId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Commissions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Commissions {
  #[sea_orm(iden = "agent_promocode_commissions")]
  Table,
  Id,
  AgentId,
  PromocodeId,
  SubscriptionId,
  CommissionStatus,
  Amount,
  Currency,
  CreatedAt,
  UpdatedAt,
}
