//! Directory of `<clazzId>.json` descriptor files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Target, TargetError, TargetStore};

/// Target store keeping one JSON descriptor file per target.
pub struct JsonDirTargetStore {
    dir: PathBuf,
}

impl JsonDirTargetStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TargetError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Descriptor path for `id`, or `None` when the id is not a safe file stem.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        is_valid_file_stem(id).then(|| self.dir.join(format!("{}.json", id)))
    }

    fn read_descriptor(path: &Path) -> Result<Target, TargetError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| TargetError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Ids map to file names one-to-one, so anything that would need escaping is refused.
fn is_valid_file_stem(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl TargetStore for JsonDirTargetStore {
    fn list(&self) -> Result<Vec<Target>, TargetError> {
        let mut targets = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_descriptor(&path) {
                Ok(target) => targets.push(target),
                // One corrupt file should not hide the rest of the list.
                Err(e) => warn!("Skipping unreadable target descriptor: {}", e),
            }
        }
        targets.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = targets.len(), dir = %self.dir.display(), "Loaded target descriptors");
        Ok(targets)
    }

    fn get(&self, id: &str) -> Result<Option<Target>, TargetError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match Self::read_descriptor(&path) {
            Ok(target) => Ok(Some(target)),
            Err(TargetError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, target: &Target) -> Result<(), TargetError> {
        let path = self
            .path_for(&target.id)
            .ok_or_else(|| TargetError::InvalidId(target.id.clone()))?;
        let json = serde_json::to_string_pretty(target).map_err(|e| TargetError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json)?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), TargetError> {
        let Some(path) = self.path_for(id) else {
            return Err(TargetError::NotFound(id.to_string()));
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TargetError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ClazzType;
    use tempfile::TempDir;

    fn store() -> (JsonDirTargetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonDirTargetStore::new(temp_dir.path().join("selected_courses")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_save_list_get() {
        let (store, _dir) = store();
        store
            .save(&Target::new("200", "b", "Physics", ClazzType::Retake))
            .unwrap();
        store
            .save(&Target::new("100", "a", "Calculus", ClazzType::InPlan))
            .unwrap();

        let targets = store.list().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, "100");
        assert_eq!(targets[1].category, ClazzType::Retake);

        assert_eq!(store.get("200").unwrap().unwrap().name, "Physics");
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_remove_deletes_file() {
        let (store, _dir) = store();
        store
            .save(&Target::new("100", "a", "Calculus", ClazzType::InPlan))
            .unwrap();
        assert!(store.dir().join("100.json").exists());

        store.remove("100").unwrap();
        assert!(!store.dir().join("100.json").exists());
        assert!(matches!(store.remove("100"), Err(TargetError::NotFound(_))));
    }

    #[test]
    fn test_list_skips_corrupt_and_foreign_files() {
        let (store, _dir) = store();
        store
            .save(&Target::new("100", "a", "Calculus", ClazzType::InPlan))
            .unwrap();
        fs::write(store.dir().join("broken.json"), "{not json").unwrap();
        fs::write(store.dir().join("notes.txt"), "hello").unwrap();

        let targets = store.list().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, "100");
    }

    #[test]
    fn test_reads_descriptor_written_by_hand() {
        let (store, _dir) = store();
        fs::write(
            store.dir().join("555.json"),
            r#"{"clazzId": "555", "secretVal": "k", "courseName": "英语", "teacher": "李四", "clazzType": "FANKC"}"#,
        )
        .unwrap();

        let target = store.get("555").unwrap().unwrap();
        assert_eq!(target.teacher, "李四");
        assert_eq!(target.category, ClazzType::InPlan);
    }

    #[test]
    fn test_ids_cannot_escape_directory() {
        let (store, _dir) = store();
        let err = store
            .save(&Target::new("../evil", "a", "x", ClazzType::InPlan))
            .unwrap_err();
        assert!(matches!(err, TargetError::InvalidId(_)));
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("../evil").unwrap().is_none());
        assert!(matches!(store.remove("../evil"), Err(TargetError::NotFound(_))));
    }

    #[test]
    fn test_distinct_ids_never_share_a_file() {
        let (store, _dir) = store();
        store
            .save(&Target::new("a_b", "k1", "Calculus", ClazzType::InPlan))
            .unwrap();
        assert!(matches!(
            store.save(&Target::new("a.b", "k2", "Physics", ClazzType::InPlan)),
            Err(TargetError::InvalidId(_))
        ));

        let targets = store.list().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "Calculus");
        assert!(store.get("a.b").unwrap().is_none());
    }
}
