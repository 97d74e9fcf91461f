//! # Candlewick Store
//!
//! Small persistence layer behind the HTTP façade: user accounts, the
//! questionnaire completion flag and login sessions.
//!
//! Accounts and questionnaire flags sit behind repository traits
//! ([`AccountRepository`], [`QuestionnaireRepository`]) so the storage
//! engine can change without touching request handlers. The shipped engines
//! are a JSON object file ([`JsonFileMap`]) and process-local memory.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`accounts`] | Account record and repositories |
//! | [`questionnaire`] | Completion flags and repositories |
//! | [`session`] | TTL session store |
//! | [`password`] | Salted password hashing |
//! | [`json_file`] | Atomic JSON-file map |

pub mod accounts;
pub mod error;
pub mod json_file;
pub mod password;
pub mod questionnaire;
pub mod session;

pub use accounts::{Account, AccountRepository, JsonAccountStore, MemoryAccountStore};
pub use error::StoreError;
pub use json_file::JsonFileMap;
pub use password::{hash_password, verify_password};
pub use questionnaire::{JsonQuestionnaireStore, MemoryQuestionnaireStore, QuestionnaireRepository};
pub use session::{SessionStore, DEFAULT_SESSION_TTL};
