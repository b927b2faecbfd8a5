use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_agents::Agents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Promocodes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Promocodes::Id).string().not_null().primary_key(),
          )
          .col(
            ColumnDef::new(Promocodes::Code).string().not_null().unique_key(),
          )
          .col(ColumnDef::new(Promocodes::AssignedAgentId).string().null())
          .col(ColumnDef::new(Promocodes::DiscountType).string().not_null())
          .col(
            ColumnDef::new(Promocodes::DiscountValue)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Promocodes::ValidFrom).date_time().null())
          .col(ColumnDef::new(Promocodes::ValidTo).date_time().null())
          .col(
            ColumnDef::new(Promocodes::RedemptionCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Promocodes::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(Promocodes::LinkedSubscriptionId).string().null(),
          )
          .col(ColumnDef::new(Promocodes::CreatedByAdminId).string().null())
          .col(ColumnDef::new(Promocodes::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Promocodes::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_promocodes_agent")
              .from(Promocodes::Table, Promocodes::AssignedAgentId)
              .to(Agents::Table, Agents::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_promocodes_agent")
          .table(Promocodes::Table)
          .col(Promocodes::AssignedAgentId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Promocodes::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Promocodes {
  Table,
  Id,
  Code,
  AssignedAgentId,
  DiscountType,
  DiscountValue,
  ValidFrom,
  ValidTo,
  RedemptionCount,
  Status,
  LinkedSubscriptionId,
  CreatedByAdminId,
  CreatedAt,
  UpdatedAt,
}
