use hubmirror::db;
use hubmirror::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if let MigrateAction::Fresh { yes: false } = action {
        return Err("`migrate fresh` deletes every stored document; pass --yes to confirm".into());
    }

    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?.len();
            if pending == 0 {
                println!("Schema is up to date.");
            } else {
                Migrator::up(&db, None).await?;
                println!("Applied {pending} migration(s).");
            }
        }
        MigrateAction::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            println!("Rolled back {steps} migration(s).");
        }
        MigrateAction::Status => {
            for migration in Migrator::get_migration_with_status(&db).await? {
                println!("{:<10} {}", format!("{:?}", migration.status()), migration.name());
            }
        }
        MigrateAction::Fresh { .. } => {
            Migrator::fresh(&db).await?;
            tracing::warn!(database = %database_url, "Dropped and recreated all collections");
            println!("Fresh migration complete.");
        }
    }

    Ok(())
}
