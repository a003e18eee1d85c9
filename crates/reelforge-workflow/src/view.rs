//! Plain-structure view of a task.
//!
//! [`TaskContext::to_view`] renders the entity as a tree of JSON primitives
//! suitable for any wire format: the lifecycle state becomes its canonical name
//! and every duration becomes a floating-point number of seconds.
//! [`TaskContext::from_view`] is the inverse.

use serde_json::Value;

use crate::error::ViewError;
use crate::models::TaskContext;

impl TaskContext {
    /// Render the task as a plain nested structure.
    pub fn to_view(&self) -> Result<Value, ViewError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a task from a structure produced by [`TaskContext::to_view`].
    pub fn from_view(view: Value) -> Result<TaskContext, ViewError> {
        Ok(serde_json::from_value(view)?)
    }
}

/// Serde adapter storing a [`std::time::Duration`] as fractional seconds.
pub(crate) mod seconds {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid duration in seconds: {secs}")))
    }
}
