//! PostgreSQL storage backend.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tasks::{Task, TaskQuery, TaskStatus};
use tracing::{debug, info};

use super::{Storage, StorageError, StorageResult};
use crate::models::{NewTask, NewUser, TaskChanges, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, t.deadline, \
     t.assignee_id, u.name AS assignee_name, t.created_at, t.updated_at \
     FROM tasks t LEFT JOIN users u ON u.id = t.assignee_id";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: NaiveDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    deadline: Option<NaiveDateTime>,
    assignee_id: Option<i64>,
    assignee_name: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = StorageError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("task {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            deadline: row.deadline,
            assignee_id: row.assignee_id,
            assignee_name: row.assignee_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> StorageResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

/// Append the `WHERE`, `ORDER BY` and `LIMIT` clauses for a chat query.
fn push_query_clauses(builder: &mut QueryBuilder<'_, Postgres>, query: &TaskQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder.push(" AND t.status = ").push_bind(status.as_str());
    }
    if query.exclude_done {
        builder
            .push(" AND t.status <> ")
            .push_bind(TaskStatus::Done.as_str());
    }
    if let Some(from) = query.deadline_from {
        builder.push(" AND t.deadline >= ").push_bind(from);
    }
    if let Some(until) = query.deadline_until {
        builder.push(" AND t.deadline < ").push_bind(until);
    }
    builder
        .push(" ORDER BY t.deadline ASC NULLS LAST, t.created_at DESC, t.id DESC LIMIT ")
        .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
}

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    async fn fetch_task<'e, E>(executor: E, id: i64) -> StorageResult<Option<Task>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!("{TASK_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .map(Task::try_from)
            .transpose()
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(Utc::now().naive_utc())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_task(&self, task: NewTask) -> StorageResult<Task> {
        let now = Utc::now().naive_utc();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tasks (title, description, status, deadline, assignee_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING id",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.deadline)
        .bind(task.assignee_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Self::fetch_task(&self.pool, id)
            .await?
            .ok_or_else(|| StorageError::Database(format!("task {id} vanished after insert")))
    }

    async fn get_task(&self, id: i64) -> StorageResult<Option<Task>> {
        Self::fetch_task(&self.pool, id).await
    }

    async fn list_tasks(&self) -> StorageResult<Vec<Task>> {
        let sql = format!("{TASK_SELECT} ORDER BY t.created_at DESC, t.id DESC");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> StorageResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, description, status, deadline, assignee_id, \
             NULL::TEXT AS assignee_name, created_at, updated_at \
             FROM tasks WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut task = Task::try_from(row)?;
        changes.apply(&mut task);

        sqlx::query(
            "UPDATE tasks SET title = $1, description = $2, status = $3, deadline = $4, \
             assignee_id = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.deadline)
        .bind(task.assignee_id)
        .bind(task.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let updated = Self::fetch_task(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_task(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query_tasks(&self, query: &TaskQuery) -> StorageResult<Vec<Task>> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_SELECT);
        push_query_clauses(&mut builder, query);
        let rows = builder
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }
}
