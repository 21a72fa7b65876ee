use serde_json::Value;
use thiserror::Error;

use crate::models::StudentRecord;

pub const STUDENT_DATA_KEY: &str = "student_data";
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write session key {key}: {reason}")]
    Write { key: String, reason: String },
}

/// Per-session key/value storage supplied by the session middleware.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError>;
    fn set(&self, key: &str, value: Value) -> Result<(), SessionError>;
    fn remove(&self, key: &str);
}

impl SessionStore for actix_session::Session {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        actix_session::Session::get::<Value>(self, key).map_err(|err| SessionError::Read {
            key: key.to_string(),
            reason: err.to_string(),
        })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.insert(key, value).map_err(|err| SessionError::Write {
            key: key.to_string(),
            reason: err.to_string(),
        })
    }

    fn remove(&self, key: &str) {
        let _ = actix_session::Session::remove(self, key);
    }
}

/// In-process store used to exercise the slot without the middleware.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySession {
    values: std::cell::RefCell<std::collections::HashMap<String, Value>>,
}

#[cfg(test)]
impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Single slot holding the most recently scored student of a session.
pub struct RecordSlot<'a, S: SessionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SessionStore + ?Sized> RecordSlot<'a, S> {
    pub fn new(store: &'a S) -> Self {
        RecordSlot { store }
    }

    pub fn store(&self, record: &StudentRecord) -> Result<(), SessionError> {
        let value = serde_json::to_value(record).map_err(|err| SessionError::Write {
            key: STUDENT_DATA_KEY.to_string(),
            reason: err.to_string(),
        })?;
        self.store.set(STUDENT_DATA_KEY, value)
    }

    pub fn load(&self) -> Result<Option<StudentRecord>, SessionError> {
        let Some(value) = self.store.get(STUDENT_DATA_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                // A slot written by an older build is treated as empty.
                tracing::warn!(error = %err, "discarding unreadable student record from session");
                self.store.remove(STUDENT_DATA_KEY);
                Ok(None)
            }
        }
    }

    /// Returns the held record only when it belongs to `student_id`.
    pub fn load_for(&self, student_id: &str) -> Result<Option<StudentRecord>, SessionError> {
        Ok(self
            .load()?
            .filter(|record| record.student_id == student_id))
    }
}

pub fn current_user<S: SessionStore + ?Sized>(store: &S) -> Result<Option<String>, SessionError> {
    Ok(store
        .get(USERNAME_KEY)?
        .and_then(|value| value.as_str().map(str::to_string)))
}
