use std::future::Future;
use std::time::Duration;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr, Statement};

use crate::domain::DomainError;

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            contact TEXT,
            phone TEXT,
            address TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            budget REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Planifié',
            chef_projet_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS product_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            unit TEXT NOT NULL,
            category TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS commandes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT,
            statut_cmd TEXT NOT NULL DEFAULT 'EnAttenteAssignation',
            date_cmd TEXT NOT NULL,
            montant_total REAL NOT NULL,
            fournisseur_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            projet_id INTEGER NOT NULL REFERENCES projects(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS command_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            commande_id INTEGER NOT NULL REFERENCES commandes(id) ON DELETE CASCADE,
            product_type_id INTEGER NOT NULL REFERENCES product_types(id),
            quantite_commandee INTEGER NOT NULL CHECK (quantite_commandee >= 1),
            prix_unitaire REAL CHECK (prix_unitaire IS NULL OR prix_unitaire >= 0),
            statut_ligne TEXT NOT NULL DEFAULT 'Soumis',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(commande_id, product_type_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS stock_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_type_id INTEGER NOT NULL REFERENCES product_types(id),
            command_item_id INTEGER NOT NULL UNIQUE REFERENCES command_items(id),
            quantite_disponible REAL NOT NULL CHECK (quantite_disponible >= 0),
            date_entree_stock TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS project_commandes (
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            commande_id INTEGER NOT NULL REFERENCES commandes(id) ON DELETE CASCADE,
            PRIMARY KEY (project_id, commande_id)
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_commandes_projet ON commandes(projet_id)",
        "CREATE INDEX IF NOT EXISTS idx_commandes_fournisseur ON commandes(fournisseur_id)",
        "CREATE INDEX IF NOT EXISTS idx_command_items_commande ON command_items(commande_id)",
        "CREATE INDEX IF NOT EXISTS idx_projects_chef ON projects(chef_projet_id)",
    ];

    for sql in statements {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_owned(),
        ))
        .await?;
    }

    Ok(())
}

/// Commits on success, rolls back on error. The body's error wins over a
/// rollback failure, which is only logged.
pub async fn settle<T>(
    txn: DatabaseTransaction,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match result {
        Ok(value) => {
            txn.commit()
                .await
                .map_err(|e| DomainError::Transaction(format!("commit failed: {}", e)))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Rollback failed after '{}': {}", err, rollback_err);
            }
            Err(err)
        }
    }
}

/// Bounds a transactional operation. On expiry the future is dropped, which
/// drops its open transaction and rolls it back.
pub async fn with_deadline<T, F>(limit: Duration, op: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Transaction exceeded its {:?} deadline", limit);
            Err(DomainError::Transaction(format!(
                "transaction did not complete within {:?}",
                limit
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = init_db("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
    }

    #[tokio::test]
    async fn deadline_expiry_is_retryable() {
        let result: Result<(), DomainError> = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(result.unwrap_err().is_retryable());
    }
}
