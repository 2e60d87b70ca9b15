//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tasks::{Task, TaskQuery};
use tokio::sync::RwLock;

use super::{Storage, StorageError, StorageResult};
use crate::models::{NewTask, NewUser, TaskChanges, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
}

impl Tables {
    fn assignee_name(&self, assignee_id: Option<i64>) -> Option<String> {
        assignee_id
            .and_then(|id| self.users.get(&id))
            .map(|u| u.name.clone())
    }

    fn with_assignee_name(&self, mut task: Task) -> Task {
        task.assignee_name = self.assignee_name(task.assignee_id);
        task
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict { field: "email" });
        }
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(StorageError::Conflict { field: "name" });
        }

        tables.next_user_id += 1;
        let stored = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now().naive_utc(),
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn create_task(&self, task: NewTask) -> StorageResult<Task> {
        let mut tables = self.tables.write().await;
        tables.next_task_id += 1;
        let name = tables.assignee_name(task.assignee_id);
        let stored = task.into_task(tables.next_task_id, name);
        tables.tasks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_task(&self, id: i64) -> StorageResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&id)
            .cloned()
            .map(|t| tables.with_assignee_name(t)))
    }

    async fn list_tasks(&self) -> StorageResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .cloned()
            .map(|t| tables.with_assignee_name(t))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> StorageResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        let Some(mut task) = tables.tasks.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut task);
        let task = tables.with_assignee_name(task);
        tables.tasks.insert(id, task.clone());
        Ok(Some(task))
    }

    async fn delete_task(&self, id: i64) -> StorageResult<bool> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn query_tasks(&self, query: &TaskQuery) -> StorageResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let tasks = tables
            .tasks
            .values()
            .cloned()
            .map(|t| tables.with_assignee_name(t));
        Ok(query.apply(tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};
    use tasks::{detect_intent, TaskStatus};

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            deadline: None,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let store = MemoryStorage::new();
        let budi = store
            .create_user(new_user("Budi", "budi@example.com"))
            .await
            .unwrap();
        assert_eq!(budi.id, 1);

        let err = store
            .create_user(new_user("Budi 2", "budi@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { field: "email" }));

        let err = store
            .create_user(new_user("Budi", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { field: "name" }));

        let found = store.find_user_by_email("budi@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_task_crud_with_assignee_name() {
        let store = MemoryStorage::new();
        let siti = store
            .create_user(new_user("Siti", "siti@example.com"))
            .await
            .unwrap();

        let mut task = new_task("Laporan");
        task.assignee_id = Some(siti.id);
        let created = store.create_task(task).await.unwrap();
        assert_eq!(created.assignee_name.as_deref(), Some("Siti"));

        let changes = TaskChanges {
            status: Some(TaskStatus::InProgress),
            assignee_id: Some(None),
            ..TaskChanges::default()
        };
        let updated = store
            .update_task(created.id, &changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.assignee_name, None);
        assert!(updated.updated_at >= created.updated_at);

        assert!(store
            .update_task(99, &TaskChanges::default())
            .await
            .unwrap()
            .is_none());

        assert!(store.delete_task(created.id).await.unwrap());
        assert!(!store.delete_task(created.id).await.unwrap());
        assert!(store.get_task(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_tasks_newest_first() {
        let store = MemoryStorage::new();
        for title in ["a", "b", "c"] {
            store.create_task(new_task(title)).await.unwrap();
        }
        let titles: Vec<String> = store
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_query_tasks_overdue() {
        let store = MemoryStorage::new();
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap_or(NaiveDate::MIN);

        let mut late = new_task("late");
        late.deadline = yesterday.and_hms_opt(12, 0, 0);
        store.create_task(late.clone()).await.unwrap();

        late.title = "late but done".to_string();
        late.status = TaskStatus::Done;
        store.create_task(late).await.unwrap();

        store.create_task(new_task("no deadline")).await.unwrap();

        let query = TaskQuery::for_intent(&detect_intent("overdue"), today);
        let result = store.query_tasks(&query).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "late");
    }
}
