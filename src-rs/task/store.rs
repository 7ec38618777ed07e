use std::fs::{self, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Map;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{Task, TaskError, TaskKind, TaskPatch, TaskStatus};

/// Upper bound on records returned by [`TaskStore::list`].
pub const LIST_CAP: usize = 20;

const ID_LEN: usize = 8;
const CREATE_ATTEMPTS: usize = 5;

/// One JSON file per task under a single directory. External agents read and
/// rewrite these files directly.
pub struct TaskStore {
    dir: PathBuf,
    strict_transitions: bool,
}

impl TaskStore {
    pub fn open(dir: impl Into<PathBuf>, strict_transitions: bool) -> Result<Self, TaskError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            strict_transitions,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn task_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn create(&self, description: &str) -> Result<Task, TaskError> {
        self.create_with(description, &mut next_id)
    }

    fn create_with(
        &self,
        description: &str,
        next_id: &mut dyn FnMut() -> String,
    ) -> Result<Task, TaskError> {
        for _ in 0..CREATE_ATTEMPTS {
            let now = Utc::now();
            let task = Task {
                id: next_id(),
                kind: TaskKind::DelegatedWork,
                description: description.to_string(),
                params: Map::new(),
                status: TaskStatus::Pending,
                created_at: now,
                updated_at: now,
                result: None,
                error: None,
                extra: Map::new(),
            };
            match self.write_new(&task) {
                Ok(()) => {
                    info!(task_id = %task.id, "task created");
                    return Ok(task);
                }
                Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
                    warn!(task_id = %task.id, "task id collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(TaskError::Persistence(
            "could not allocate a unique task id".to_string(),
        ))
    }

    pub fn get(&self, id: &str) -> Result<Task, TaskError> {
        if !valid_id(id) {
            return Err(TaskError::NotFound(id.to_string()));
        }
        let path = self.task_path(id);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                return Err(TaskError::NotFound(id.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        let task: Task = serde_json::from_str(&data)
            .map_err(|err| TaskError::Persistence(format!("{}: {}", path.display(), err)))?;
        if task.id != id {
            return Err(TaskError::Persistence(format!(
                "{}: record carries id {}",
                path.display(),
                task.id
            )));
        }
        Ok(task)
    }

    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let mut task = self.get(id)?;

        if self.strict_transitions
            && task.status.is_terminal()
            && (patch.result.is_some() || patch.error.is_some())
        {
            return Err(TaskError::Finalized {
                id: id.to_string(),
                status: task.status,
            });
        }
        if let Some(next) = patch.status {
            if self.strict_transitions && !task.status.can_move_to(next) {
                return Err(TaskError::InvalidTransition {
                    id: id.to_string(),
                    from: task.status,
                    to: next,
                });
            }
            task.status = next;
        }
        if patch.result.is_some() {
            task.result = patch.result;
        }
        if patch.error.is_some() {
            task.error = patch.error;
        }
        if let Some(params) = patch.params {
            task.params = params;
        }
        let now = Utc::now();
        // Keep updated_at strictly increasing even on coarse clocks.
        task.updated_at = if now > task.updated_at {
            now
        } else {
            task.updated_at + chrono::Duration::microseconds(1)
        };

        self.write_replace(&task)?;
        debug!(task_id = %id, status = %task.status, "task updated");
        Ok(task)
    }

    /// Newest first, capped at [`LIST_CAP`]. Files that fail to parse are
    /// skipped so one bad record cannot hide the rest.
    pub fn list(&self, filter: Option<TaskStatus>) -> Result<Vec<Task>, TaskError> {
        let mut items = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let id = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(id) => id.to_string(),
                None => continue,
            };
            match self.get(&id) {
                Ok(task) => {
                    if filter.map_or(true, |status| task.status == status) {
                        items.push(task);
                    }
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping task file"),
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(LIST_CAP);
        Ok(items)
    }

    /// Publishes a fully written temp file under the task's name with a hard
    /// link, which fails with `AlreadyExists` instead of replacing a record.
    fn write_new(&self, task: &Task) -> std::io::Result<()> {
        let tmp = self.write_temp(task)?;
        let result = fs::hard_link(&tmp, self.task_path(&task.id));
        let _ = fs::remove_file(&tmp);
        result
    }

    fn write_replace(&self, task: &Task) -> std::io::Result<()> {
        let tmp = self.write_temp(task)?;
        let result = fs::rename(&tmp, self.task_path(&task.id));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Serialized and synced to disk under a dot-prefixed name `list` skips.
    fn write_temp(&self, task: &Task) -> std::io::Result<PathBuf> {
        let tmp = self
            .dir
            .join(format!(".{}.json.tmp.{}", task.id, Uuid::new_v4().simple()));
        let serialized = serde_json::to_string_pretty(task)
            .map_err(|err| std::io::Error::new(IoErrorKind::InvalidData, err))?;

        let result = (|| -> std::io::Result<()> {
            let mut file = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()
        })();
        match result {
            Ok(()) => Ok(tmp),
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(err)
            }
        }
    }
}

fn next_id() -> String {
    Uuid::new_v4().simple().to_string()[..ID_LEN].to_string()
}

/// Ids are used as file names; anything that could escape the directory is
/// treated as unknown.
fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store(strict: bool) -> (tempfile::TempDir, TaskStore) {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks"), strict).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_then_get() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("backup the config").unwrap();

        assert_eq!(task.id.len(), ID_LEN);
        let loaded = store.get(&task.id).unwrap();
        assert_eq!(loaded.status, TaskStatus::Pending);
        assert_eq!(loaded.description, "backup the config");
        assert!(loaded.result.is_none());
        assert!(loaded.error.is_none());
        assert_eq!(loaded.created_at, loaded.updated_at);
        assert!(store.task_path(&task.id).exists());
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let (_dir, store) = create_test_store(false);
        for id in ["deadbeef", "", "../etc/passwd", "a/b"] {
            match store.get(id) {
                Err(TaskError::NotFound(_)) => {}
                other => panic!("expected NotFound for {:?}, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_update_merges_fields() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("compress logs").unwrap();

        let patch = TaskPatch::status(TaskStatus::Completed).with_result("x");
        let updated = store.update(&task.id, patch).unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);

        let loaded = store.get(&task.id).unwrap();
        assert_eq!(loaded.status, TaskStatus::Completed);
        assert_eq!(loaded.result.as_deref(), Some("x"));
        assert_eq!(loaded.description, "compress logs");
        assert!(loaded.updated_at > task.updated_at);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let (_dir, store) = create_test_store(false);
        let err = store
            .update("00000000", TaskPatch::status(TaskStatus::Failed))
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[test]
    fn test_update_leaves_no_temp_files() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("a").unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Processing))
            .unwrap();

        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![format!("{}.json", task.id)]);
    }

    #[test]
    fn test_permissive_mode_allows_any_transition() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("a").unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        let reverted = store
            .update(&task.id, TaskPatch::status(TaskStatus::Pending))
            .unwrap();
        assert_eq!(reverted.status, TaskStatus::Pending);
    }

    #[test]
    fn test_strict_mode_rejects_reverting_terminal_status() {
        let (_dir, store) = create_test_store(true);
        let task = store.create("a").unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Processing))
            .unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Failed).with_error("disk full"))
            .unwrap();

        let err = store
            .update(&task.id, TaskPatch::status(TaskStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTransition { .. }));
        assert_eq!(store.get(&task.id).unwrap().status, TaskStatus::Failed);
    }

    #[test]
    fn test_list_is_capped_and_newest_first() {
        let (_dir, store) = create_test_store(false);
        for i in 0..25 {
            store.create(&format!("task {}", i)).unwrap();
        }

        let tasks = store.list(None).unwrap();
        assert_eq!(tasks.len(), LIST_CAP);
        for pair in tasks.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn test_list_filters_by_status() {
        let (_dir, store) = create_test_store(false);
        let a = store.create("a").unwrap();
        store.create("b").unwrap();
        store
            .update(&a.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();

        let done = store.list(Some(TaskStatus::Completed)).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);
        assert_eq!(store.list(Some(TaskStatus::Pending)).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_record_is_persistence_error() {
        let (_dir, store) = create_test_store(false);
        fs::write(store.task_path("badf00d0"), "{ not json").unwrap();

        let err = store.get("badf00d0").unwrap_err();
        assert!(matches!(err, TaskError::Persistence(_)));

        store.create("still listed").unwrap();
        assert_eq!(store.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_get_is_identical() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("stable").unwrap();
        let first = serde_json::to_string(&store.get(&task.id).unwrap()).unwrap();
        let second = serde_json::to_string(&store.get(&task.id).unwrap()).unwrap();
        assert_eq!(first, second);
        let on_disk_a = fs::read(store.task_path(&task.id)).unwrap();
        let _ = store.get(&task.id).unwrap();
        let on_disk_b = fs::read(store.task_path(&task.id)).unwrap();
        assert_eq!(on_disk_a, on_disk_b);
    }

    fn file_names(store: &TaskStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_create_never_overwrites_existing_file() {
        let (_dir, store) = create_test_store(false);
        let existing = store.create("first").unwrap();
        let mut clash = existing.clone();
        clash.description = "second".to_string();

        let err = store.write_new(&clash).unwrap_err();
        assert_eq!(err.kind(), IoErrorKind::AlreadyExists);
        assert_eq!(store.get(&existing.id).unwrap().description, "first");
        assert_eq!(file_names(&store), vec![format!("{}.json", existing.id)]);
    }

    #[test]
    fn test_create_retries_after_id_collision() {
        let (_dir, store) = create_test_store(false);
        let existing = store.create("first").unwrap();

        let mut ids = vec![existing.id.clone(), "feedface".to_string()].into_iter();
        let mut calls = 0;
        let mut source = || {
            calls += 1;
            ids.next().unwrap()
        };
        let task = store.create_with("second", &mut source).unwrap();

        assert_eq!(calls, 2);
        assert_eq!(task.id, "feedface");
        assert_eq!(store.get("feedface").unwrap().description, "second");
        assert_eq!(store.get(&existing.id).unwrap().description, "first");
        assert_eq!(
            file_names(&store),
            {
                let mut expected = vec![format!("{}.json", existing.id), "feedface.json".to_string()];
                expected.sort();
                expected
            }
        );
    }

    #[test]
    fn test_create_gives_up_when_ids_keep_colliding() {
        let (_dir, store) = create_test_store(false);
        let existing = store.create("first").unwrap();
        let id = existing.id.clone();

        let err = store.create_with("second", &mut || id.clone()).unwrap_err();
        assert!(matches!(err, TaskError::Persistence(_)));
        assert_eq!(file_names(&store), vec![format!("{}.json", existing.id)]);
    }

    #[test]
    fn test_loads_record_written_by_agent_with_local_timestamps() {
        let (_dir, store) = create_test_store(false);
        let record = r#"{
  "id": "ab12cd34",
  "type": "claude_code",
  "description": "rotate the logs",
  "params": {},
  "status": "completed",
  "created_at": "2026-01-02T03:04:05.123456",
  "result": "rotated 4 files",
  "error": null
}"#;
        fs::write(store.task_path("ab12cd34"), record).unwrap();

        let task = store.get("ab12cd34").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("rotated 4 files"));
        assert_eq!(task.updated_at, task.created_at);
        assert_eq!(store.list(None).unwrap().len(), 1);
        assert_eq!(store.list(Some(TaskStatus::Completed)).unwrap().len(), 1);

        let updated = store
            .update("ab12cd34", TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        assert!(updated.updated_at > task.created_at);
        assert_eq!(store.get("ab12cd34").unwrap().created_at, task.created_at);
    }

    #[test]
    fn test_strict_mode_keeps_final_result() {
        let (_dir, store) = create_test_store(true);
        let task = store.create("a").unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Completed).with_result("x"))
            .unwrap();

        let err = store
            .update(&task.id, TaskPatch::status(TaskStatus::Completed).with_result("y"))
            .unwrap_err();
        assert!(matches!(err, TaskError::Finalized { .. }));
        let err = store
            .update(&task.id, TaskPatch::default().with_error("late"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::result::ErrorKind::InvalidTransition);

        let loaded = store.get(&task.id).unwrap();
        assert_eq!(loaded.result.as_deref(), Some("x"));
        assert!(loaded.error.is_none());
        // A bare status repeat is still accepted.
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();
    }

    #[test]
    fn test_permissive_mode_allows_result_rewrite() {
        let (_dir, store) = create_test_store(false);
        let task = store.create("a").unwrap();
        store
            .update(&task.id, TaskPatch::status(TaskStatus::Completed).with_result("x"))
            .unwrap();
        let again = store
            .update(&task.id, TaskPatch::default().with_result("y"))
            .unwrap();
        assert_eq!(again.result.as_deref(), Some("y"));
    }
}
