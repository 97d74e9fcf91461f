use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use candlewick_core::UtcDateTime;
use serde::{Deserialize, Serialize};

use crate::json_file::JsonFileMap;
use crate::password::{hash_password, verify_password};
use crate::StoreError;

/// Stored account. Serialized with the `password`/`created_at` keys used by
/// existing `users.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "password")]
    pub password_hash: String,
    pub created_at: UtcDateTime,
}

impl Account {
    /// Hash `plain` and stamp the current time.
    pub fn new(plain_password: &str) -> Result<Self, StoreError> {
        Ok(Self {
            password_hash: hash_password(plain_password)?,
            created_at: UtcDateTime::now(),
        })
    }

    pub fn verify(&self, plain_password: &str) -> bool {
        verify_password(plain_password, &self.password_hash)
    }
}

/// Narrow storage seam for accounts; the HTTP layer only sees this trait.
pub trait AccountRepository: Send + Sync {
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Insert or replace.
    fn put(&self, username: &str, account: Account) -> Result<(), StoreError>;

    /// Insert, failing with [`StoreError::Conflict`] when the name is taken.
    fn insert_new(&self, username: &str, account: Account) -> Result<(), StoreError>;
}

/// Accounts kept in a JSON file keyed by username.
#[derive(Debug)]
pub struct JsonAccountStore {
    file: JsonFileMap<Account>,
}

impl JsonAccountStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFileMap::open(path)?,
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.file.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl AccountRepository for JsonAccountStore {
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.file.get(username)
    }

    fn put(&self, username: &str, account: Account) -> Result<(), StoreError> {
        self.file.update(|accounts| {
            accounts.insert(username.to_owned(), account);
            Ok(())
        })
    }

    fn insert_new(&self, username: &str, account: Account) -> Result<(), StoreError> {
        self.file.update(|accounts| {
            if accounts.contains_key(username) {
                return Err(StoreError::Conflict {
                    key: username.to_owned(),
                });
            }
            accounts.insert(username.to_owned(), account);
            Ok(())
        })?;

        tracing::info!(username, "account created");
        Ok(())
    }
}

/// Process-local accounts, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountRepository for MemoryAccountStore {
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(accounts.get(username).cloned())
    }

    fn put(&self, username: &str, account: Account) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.insert(username.to_owned(), account);
        Ok(())
    }

    fn insert_new(&self, username: &str, account: Account) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if accounts.contains_key(username) {
            return Err(StoreError::Conflict {
                key: username.to_owned(),
            });
        }
        accounts.insert(username.to_owned(), account);
        Ok(())
    }
}
