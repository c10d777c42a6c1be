//! Lifecycle state shared by partitions, access grants and pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EntityState {
    #[default]
    Created,
    Checked,
    Active,
    Inactive,
    Deleted,
}

impl EntityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityState::Created => "Created",
            EntityState::Checked => "Checked",
            EntityState::Active => "Active",
            EntityState::Inactive => "Inactive",
            EntityState::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(EntityState::Created),
            "Checked" => Ok(EntityState::Checked),
            "Active" => Ok(EntityState::Active),
            "Inactive" => Ok(EntityState::Inactive),
            "Deleted" => Ok(EntityState::Deleted),
            other => Err(format!("unknown entity state: {other}")),
        }
    }
}
