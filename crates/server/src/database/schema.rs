use sqlx::{Error as SqlxError, Postgres, Transaction};
use tracing::instrument;

use crate::database::connection::DbConnection;

impl DbConnection {
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }

    pub async fn drop_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_tables(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            CREATE TABLE users (
                username        VARCHAR(30) PRIMARY KEY,
                password_hash   TEXT NOT NULL,
                first_name      VARCHAR(50) NOT NULL,
                last_name       VARCHAR(50) NOT NULL,
                phone           VARCHAR(20) NOT NULL,
                join_at         TIMESTAMP WITH TIME ZONE NOT NULL,
                last_login_at   TIMESTAMP WITH TIME ZONE
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE messages (
                id              bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                from_username   VARCHAR(30) NOT NULL REFERENCES users(username),
                to_username     VARCHAR(30) NOT NULL REFERENCES users(username),
                body            TEXT NOT NULL,
                sent_at         TIMESTAMP WITH TIME ZONE NOT NULL,
                read_at         TIMESTAMP WITH TIME ZONE
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE sessions (
                id                          uuid PRIMARY KEY,
                username                    VARCHAR(30) NOT NULL REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
                access_token_hash           BYTEA NOT NULL,
                access_token_expires_at     TIMESTAMP WITH TIME ZONE NOT NULL,
                refresh_token_hash          BYTEA NOT NULL,
                refresh_token_expires_at    TIMESTAMP WITH TIME ZONE NOT NULL,
                created_at                  TIMESTAMP WITH TIME ZONE NOT NULL
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query("CREATE INDEX messages_to_username_idx ON messages (to_username, id);")
        .execute(transaction.as_mut())
        .await?;
    sqlx::query("CREATE INDEX messages_from_username_idx ON messages (from_username, id);")
        .execute(transaction.as_mut())
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS sessions;",
        "DROP TABLE IF EXISTS messages;",
        "DROP TABLE IF EXISTS users;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}
