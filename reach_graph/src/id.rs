// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;

/// Opaque identifier for a single reach, unique within one [`crate::Catchment`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ReachId(String);

impl ReachId {
    pub fn new(id: impl Into<String>) -> Self {
        ReachId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReachId {
    fn from(s: String) -> Self {
        ReachId(s)
    }
}

impl From<&str> for ReachId {
    fn from(s: &str) -> Self {
        ReachId(s.to_owned())
    }
}
