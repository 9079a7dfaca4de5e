//! Shared query parameter types for API handlers.

use goodvibes_core::error::CoreError;
use goodvibes_core::project::{OrderColumn, ProjectOrder, SortDirection};
use serde::Deserialize;

/// Ordering parameters (`?order=&direction=`).
///
/// Both are optional; each list endpoint supplies its own default.
#[derive(Debug, Default, Deserialize)]
pub struct OrderParams {
    pub order: Option<String>,
    pub direction: Option<String>,
}

impl OrderParams {
    /// Resolve into a [`ProjectOrder`], filling gaps from `default`.
    pub fn resolve(&self, default: ProjectOrder) -> Result<ProjectOrder, CoreError> {
        let column = match self.order.as_deref() {
            None => default.column,
            Some("votes") => OrderColumn::Votes,
            Some("created_at") => OrderColumn::CreatedAt,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "Invalid order '{other}'. Must be one of: votes, created_at"
                )))
            }
        };
        let direction = match self.direction.as_deref() {
            None => default.direction,
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "Invalid direction '{other}'. Must be one of: asc, desc"
                )))
            }
        };
        Ok(ProjectOrder { column, direction })
    }
}
