use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Agents::Table)
          .if_not_exists()
          .col(ColumnDef::new(Agents::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Agents::DisplayName).string().not_null())
          .col(ColumnDef::new(Agents::Email).string().not_null())
          .col(ColumnDef::new(Agents::UserId).string().null())
          .col(ColumnDef::new(Agents::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Agents::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Agents {
  Table,
  Id,
  DisplayName,
  Email,
  UserId,
  CreatedAt,
}
