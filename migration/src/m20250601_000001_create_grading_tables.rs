use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建评分员表
        manager
            .create_table(
                Table::create()
                    .table(Graders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Graders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Graders::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Graders::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Graders::Graded).big_integer().not_null())
                    .col(ColumnDef::new(Graders::Skipped).big_integer().not_null())
                    .col(ColumnDef::new(Graders::CurrentGradingGroup).string().null())
                    .col(
                        ColumnDef::new(Graders::CompletedGradingGroups)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Graders::CalibrationScores).text().not_null())
                    .col(
                        ColumnDef::new(Graders::CalibrationMapping)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Graders::Version).big_integer().not_null())
                    .col(ColumnDef::new(Graders::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Graders::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建报名表（文书以 JSON 内嵌）
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Applications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Applications::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::Branch).string().not_null())
                    .col(ColumnDef::new(Applications::School).string().not_null())
                    .col(
                        ColumnDef::new(Applications::ApplicantEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::Status).string().not_null())
                    .col(ColumnDef::new(Applications::Essays).text().not_null())
                    .col(
                        ColumnDef::new(Applications::GradingComplete)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::FinalScore).double().null())
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分记录表
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reviews::EventId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Reviews::ApplicationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reviews::EssayId).string().not_null())
                    .col(ColumnDef::new(Reviews::ReviewerId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::Criterion).string().not_null())
                    .col(ColumnDef::new(Reviews::RawScore).integer().not_null())
                    .col(ColumnDef::new(Reviews::AdjustedScore).double().not_null())
                    .col(ColumnDef::new(Reviews::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Reviews::Table, Reviews::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        // 评分员表：一人一赛事一条
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_graders_user_event")
                    .table(Graders::Table)
                    .col(Graders::UserId)
                    .col(Graders::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_graders_event_graded")
                    .table(Graders::Table)
                    .col(Graders::EventId)
                    .col(Graders::Graded)
                    .to_owned(),
            )
            .await?;

        // 报名表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_applications_event_branch")
                    .table(Applications::Table)
                    .col(Applications::EventId)
                    .col(Applications::Branch)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_applications_status")
                    .table(Applications::Table)
                    .col(Applications::Status)
                    .to_owned(),
            )
            .await?;

        // 评分记录：同一评分员对同一文书只能评一次（并发安全的根基）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_essay_reviewer")
                    .table(Reviews::Table)
                    .col(Reviews::EssayId)
                    .col(Reviews::ReviewerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_essay_id")
                    .table(Reviews::Table)
                    .col(Reviews::EssayId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_application_id")
                    .table(Reviews::Table)
                    .col(Reviews::ApplicationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_reviewer_event")
                    .table(Reviews::Table)
                    .col(Reviews::ReviewerId)
                    .col(Reviews::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Graders::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Graders {
    #[sea_orm(iden = "graders")]
    Table,
    Id,
    UserId,
    EventId,
    Graded,
    Skipped,
    CurrentGradingGroup,
    CompletedGradingGroups,
    CalibrationScores,
    CalibrationMapping,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    #[sea_orm(iden = "applications")]
    Table,
    Id,
    EventId,
    Branch,
    School,
    ApplicantEmail,
    Status,
    Essays,
    GradingComplete,
    FinalScore,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    #[sea_orm(iden = "reviews")]
    Table,
    Id,
    EventId,
    ApplicationId,
    EssayId,
    ReviewerId,
    Criterion,
    RawScore,
    AdjustedScore,
    CreatedAt,
}
