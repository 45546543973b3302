use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Locations and categories are nested sets; a node covers every row whose
/// `lft` falls inside its `[lft, rgt]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedSetRange {
    pub lft: i32,
    pub rgt: i32,
}

impl NestedSetRange {
    pub fn contains(&self, lft: i32) -> bool {
        (self.lft..=self.rgt).contains(&lft)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub state: Option<String>,
    pub lft: i32,
    pub rgt: i32,
}

impl Location {
    pub fn range(&self) -> NestedSetRange {
        NestedSetRange {
            lft: self.lft,
            rgt: self.rgt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub lft: i32,
    pub rgt: i32,
}

impl Category {
    pub fn range(&self) -> NestedSetRange {
        NestedSetRange {
            lft: self.lft,
            rgt: self.rgt,
        }
    }
}
