use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::json_file::JsonFileMap;
use crate::StoreError;

/// Per-user completion flag of the one-time questionnaire.
pub trait QuestionnaireRepository: Send + Sync {
    /// Unknown users have not completed it.
    fn is_completed(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Idempotent.
    fn mark_completed(&self, user_id: &str) -> Result<(), StoreError>;
}

/// `{ "<user id>": true }` JSON file.
#[derive(Debug)]
pub struct JsonQuestionnaireStore {
    file: JsonFileMap<bool>,
}

impl JsonQuestionnaireStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFileMap::open(path)?,
        })
    }
}

impl QuestionnaireRepository for JsonQuestionnaireStore {
    fn is_completed(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.file.get(user_id)?.unwrap_or(false))
    }

    fn mark_completed(&self, user_id: &str) -> Result<(), StoreError> {
        self.file.update(|flags| {
            flags.insert(user_id.to_owned(), true);
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryQuestionnaireStore {
    completed: RwLock<HashSet<String>>,
}

impl MemoryQuestionnaireStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestionnaireRepository for MemoryQuestionnaireStore {
    fn is_completed(&self, user_id: &str) -> Result<bool, StoreError> {
        let completed = self
            .completed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(completed.contains(user_id))
    }

    fn mark_completed(&self, user_id: &str) -> Result<(), StoreError> {
        let mut completed = self
            .completed
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        completed.insert(user_id.to_owned());
        Ok(())
    }
}
