//! Initial migration creating the six mirrored collections.
//!
//! No foreign-key constraints are declared: children are written by key and may
//! arrive before a parent row is refreshed on a partial re-run.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_repositories(manager).await?;
        self.create_commits(manager).await?;
        self.create_contributors(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_issues(manager).await?;
        self.create_comments(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Comments::Table.into_iden(),
            Issues::Table.into_iden(),
            PullRequests::Table.into_iden(),
            Contributors::Table.into_iden(),
            Commits::Table.into_iden(),
            Repositories::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    // Naming
                    .col(ColumnDef::new(Repositories::OwnerLogin).string().not_null())
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::FullName).string().not_null())
                    // Content
                    .col(ColumnDef::new(Repositories::Description).text().null())
                    .col(ColumnDef::new(Repositories::Language).string().null())
                    // Statistics
                    .col(
                        ColumnDef::new(Repositories::StargazersCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Repositories::ForksCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Repositories::WatchersCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Repositories::OpenIssuesCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(Repositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::PushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut json_payload(Repositories::Payload))
                    .col(&mut collected_at(Repositories::CollectedAt))
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_repositories_owner_name")
                    .table(Repositories::Table)
                    .col(Repositories::OwnerLogin)
                    .col(Repositories::Name)
                    .to_owned(),
                Index::create()
                    .name("idx_repositories_updated_at")
                    .table(Repositories::Table)
                    .col(Repositories::UpdatedAt)
                    .to_owned(),
                Index::create()
                    .name("idx_repositories_collected_at")
                    .table(Repositories::Table)
                    .col(Repositories::CollectedAt)
                    .to_owned(),
            ],
        )
        .await
    }

    async fn create_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Commits::RepositoryId).big_integer().not_null())
                    .col(ColumnDef::new(Commits::Sha).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorName).string().null())
                    .col(ColumnDef::new(Commits::AuthorEmail).string().null())
                    .col(
                        ColumnDef::new(Commits::AuthorDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Commits::Message).text().not_null())
                    .col(&mut json_payload(Commits::Payload))
                    .col(&mut collected_at(Commits::CollectedAt))
                    .primary_key(Index::create().col(Commits::RepositoryId).col(Commits::Sha))
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_commits_repository_author_date")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col((Commits::AuthorDate, IndexOrder::Desc))
                    .to_owned(),
                Index::create()
                    .name("idx_commits_collected_at")
                    .table(Commits::Table)
                    .col(Commits::CollectedAt)
                    .to_owned(),
            ],
        )
        .await
    }

    async fn create_contributors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contributors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributors::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contributors::Login).string().not_null())
                    .col(
                        ColumnDef::new(Contributors::Contributions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut json_payload(Contributors::Payload))
                    .col(&mut collected_at(Contributors::CollectedAt))
                    .primary_key(
                        Index::create()
                            .col(Contributors::RepositoryId)
                            .col(Contributors::Login),
                    )
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_contributors_repository_contributions")
                    .table(Contributors::Table)
                    .col(Contributors::RepositoryId)
                    .col((Contributors::Contributions, IndexOrder::Desc))
                    .to_owned(),
                Index::create()
                    .name("idx_contributors_login")
                    .table(Contributors::Table)
                    .col(Contributors::Login)
                    .to_owned(),
            ],
        )
        .await
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequests::Number).big_integer().not_null())
                    .col(ColumnDef::new(PullRequests::State).string().not_null())
                    .col(ColumnDef::new(PullRequests::Title).text().not_null())
                    .col(
                        ColumnDef::new(PullRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut json_payload(PullRequests::Payload))
                    .col(&mut collected_at(PullRequests::CollectedAt))
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_pull_requests_repository_number")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepositoryId)
                    .col(PullRequests::Number)
                    .unique()
                    .to_owned(),
                Index::create()
                    .name("idx_pull_requests_repository_created_at")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepositoryId)
                    .col((PullRequests::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
                Index::create()
                    .name("idx_pull_requests_state")
                    .table(PullRequests::Table)
                    .col(PullRequests::State)
                    .to_owned(),
            ],
        )
        .await
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Issues::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Issues::RepositoryId).big_integer().not_null())
                    .col(ColumnDef::new(Issues::Number).big_integer().not_null())
                    .col(ColumnDef::new(Issues::State).string().not_null())
                    .col(ColumnDef::new(Issues::Title).text().not_null())
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut json_payload(Issues::Payload))
                    .col(&mut collected_at(Issues::CollectedAt))
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_issues_repository_number")
                    .table(Issues::Table)
                    .col(Issues::RepositoryId)
                    .col(Issues::Number)
                    .unique()
                    .to_owned(),
                Index::create()
                    .name("idx_issues_repository_created_at")
                    .table(Issues::Table)
                    .col(Issues::RepositoryId)
                    .col((Issues::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
                Index::create()
                    .name("idx_issues_state")
                    .table(Issues::Table)
                    .col(Issues::State)
                    .to_owned(),
            ],
        )
        .await
    }

    async fn create_comments(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Comments::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Comments::IssueId).big_integer().null())
                    .col(ColumnDef::new(Comments::PullRequestId).big_integer().null())
                    .col(ColumnDef::new(Comments::AuthorLogin).string().null())
                    .col(ColumnDef::new(Comments::Body).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Comments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut json_payload(Comments::Payload))
                    .col(&mut collected_at(Comments::CollectedAt))
                    .to_owned(),
            )
            .await?;

        create_indexes(
            manager,
            [
                Index::create()
                    .name("idx_comments_repository_issue")
                    .table(Comments::Table)
                    .col(Comments::RepositoryId)
                    .col(Comments::IssueId)
                    .to_owned(),
                Index::create()
                    .name("idx_comments_repository_pull_request")
                    .table(Comments::Table)
                    .col(Comments::RepositoryId)
                    .col(Comments::PullRequestId)
                    .to_owned(),
                Index::create()
                    .name("idx_comments_created_at")
                    .table(Comments::Table)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            ],
        )
        .await
    }
}

fn json_payload<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .json()
        .not_null()
        .default(Expr::cust("'{}'"))
        .to_owned()
}

fn collected_at<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

async fn create_indexes<const N: usize>(
    manager: &SchemaManager<'_>,
    indexes: [IndexCreateStatement; N],
) -> Result<(), DbErr> {
    for mut index in indexes {
        manager.create_index(index.if_not_exists().to_owned()).await?;
    }
    Ok(())
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    OwnerLogin,
    Name,
    FullName,
    Description,
    Language,
    StargazersCount,
    ForksCount,
    WatchersCount,
    OpenIssuesCount,
    CreatedAt,
    UpdatedAt,
    PushedAt,
    Payload,
    CollectedAt,
}

#[derive(DeriveIden)]
enum Commits {
    Table,
    RepositoryId,
    Sha,
    AuthorName,
    AuthorEmail,
    AuthorDate,
    Message,
    Payload,
    CollectedAt,
}

#[derive(DeriveIden)]
enum Contributors {
    Table,
    RepositoryId,
    Login,
    Contributions,
    Payload,
    CollectedAt,
}

#[derive(DeriveIden)]
enum PullRequests {
    Table,
    Id,
    RepositoryId,
    Number,
    State,
    Title,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    MergedAt,
    Payload,
    CollectedAt,
}

#[derive(DeriveIden)]
enum Issues {
    Table,
    Id,
    RepositoryId,
    Number,
    State,
    Title,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    Payload,
    CollectedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    RepositoryId,
    IssueId,
    PullRequestId,
    AuthorLogin,
    Body,
    CreatedAt,
    UpdatedAt,
    Payload,
    CollectedAt,
}
