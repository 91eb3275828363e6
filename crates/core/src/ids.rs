//! Identifier types for data sets, attributes, and cases.
//!
//! Case and attribute ids are opaque strings. Locally generated ids carry a
//! zero-padded creation counter in front of a uuid fragment, so sorting ids
//! lexically gives creation order. Case order inside a data set is positional
//! and never derived from the id value.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

static LOCAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a creation-time-sortable local id.
pub fn local_id() -> String {
    let count = LOCAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{:08}{}", count, &uuid[8..])
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id string.
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// An empty id is treated as "no id" by the store.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Stable case identity (never reused, never reordered with the case).
    CaseId
);

string_id!(
    /// Stable attribute identity; the display name is separately mutable.
    AttributeId
);

string_id!(
    /// Data set identity. Derived data sets refer to their source by this id.
    DataSetId
);

impl CaseId {
    pub fn new() -> Self {
        Self(local_id())
    }
}

impl AttributeId {
    pub fn new() -> Self {
        Self(local_id())
    }
}

impl DataSetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
