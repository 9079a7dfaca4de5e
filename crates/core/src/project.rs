//! Project entity, lifecycle status, categories and visibility rules.
//!
//! The status transition rules live here so the moderation console, the
//! in-memory store and the HTTP API all enforce the same lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, DeviceId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    Active,
    Rejected,
}

impl ProjectStatus {
    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Allowed: pending -> active, pending -> rejected, active -> rejected.
    /// Rejection is final.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Rejected)
                | (Self::Active, Self::Rejected)
        )
    }

    /// Validate a moderation transition, including the rejection reason rule.
    pub fn validate_transition(
        self,
        next: ProjectStatus,
        rejection_reason: Option<&str>,
    ) -> Result<(), CoreError> {
        if !self.can_transition_to(next) {
            return Err(CoreError::Conflict(format!(
                "Cannot change project status from '{self}' to '{next}'"
            )));
        }
        if next == Self::Rejected && rejection_reason.map_or(true, |r| r.trim().is_empty()) {
            return Err(CoreError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid project status '{s}'. Must be one of: pending, active, rejected"
            ))),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Thematic category of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Environment,
    Education,
    Health,
    Community,
    Other,
}

/// Every category, in display order.
pub const ALL_CATEGORIES: [Category; 5] = [
    Category::Environment,
    Category::Education,
    Category::Health,
    Category::Community,
    Category::Other,
];

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Education => "education",
            Self::Health => "health",
            Self::Community => "community",
            Self::Other => "other",
        }
    }

    /// Display label shown on cards and in the moderation table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Environment => "Umwelt & Natur",
            Self::Education => "Bildung & Lernen",
            Self::Health => "Gesundheit",
            Self::Community => "Zusammenleben",
            Self::Other => "Sonstiges",
        }
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CATEGORIES
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid category '{s}'. Must be one of: environment, education, health, community, other"
                ))
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for a raw category key; unknown keys are shown as-is.
pub fn category_label(key: &str) -> &str {
    key.parse::<Category>().map_or(key, |c| c.label())
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A submitted project proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub benefit: String,
    pub category: Category,
    pub username: String,
    pub avatar_seed: String,
    pub owner_id: DeviceId,
    pub status: ProjectStatus,
    pub votes: i64,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
}

impl Project {
    /// Whether `viewer` may see this project on the public voting page.
    ///
    /// Active projects are visible to everyone; a rejected project only to
    /// the device that submitted it. Pending projects are never public.
    pub fn is_visible_to(&self, viewer: &DeviceId) -> bool {
        match self.status {
            ProjectStatus::Active => true,
            ProjectStatus::Rejected => &self.owner_id == viewer,
            ProjectStatus::Pending => false,
        }
    }
}

/// Creation request for a project.
///
/// Has no status or vote fields: every store creates new projects as
/// pending with zero votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub benefit: String,
    pub category: Category,
    pub username: String,
    pub avatar_seed: String,
    pub owner_id: DeviceId,
}

/// Moderation update applied to an existing project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub status: ProjectStatus,
    pub rejection_reason: Option<String>,
}

impl ProjectPatch {
    pub fn approve() -> Self {
        Self {
            status: ProjectStatus::Active,
            rejection_reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            status: ProjectStatus::Rejected,
            rejection_reason: Some(reason.into()),
        }
    }

    /// Check this patch against the project's current status.
    pub fn validate_against(&self, current: ProjectStatus) -> Result<(), CoreError> {
        current.validate_transition(self.status, self.rejection_reason.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Column a project listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderColumn {
    Votes,
    CreatedAt,
}

impl OrderColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Votes => "votes",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordering of a project listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOrder {
    pub column: OrderColumn,
    pub direction: SortDirection,
}

impl ProjectOrder {
    /// Most votes first (public voting page).
    pub const MOST_VOTES: Self = Self {
        column: OrderColumn::Votes,
        direction: SortDirection::Desc,
    };

    /// Newest first (moderation console).
    pub const NEWEST: Self = Self {
        column: OrderColumn::CreatedAt,
        direction: SortDirection::Desc,
    };

    /// Sort `projects` in place. Ties keep their relative order.
    pub fn sort(self, projects: &mut [Project]) {
        projects.sort_by(|a, b| {
            let ordering = match self.column {
                OrderColumn::Votes => a.votes.cmp(&b.votes),
                OrderColumn::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

impl Default for ProjectOrder {
    fn default() -> Self {
        Self::NEWEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(status: ProjectStatus, owner: &str) -> Project {
        Project {
            id: 1,
            title: "Park Cleanup".into(),
            description: "Organize weekend park cleanups".into(),
            benefit: "Keeps parks clean for families".into(),
            category: Category::Environment,
            username: "EcoHero".into(),
            avatar_seed: "avatar-1".into(),
            owner_id: DeviceId::from(owner),
            status,
            votes: 0,
            rejection_reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn allowed_transitions() {
        use ProjectStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Active.can_transition_to(Rejected));
    }

    #[test]
    fn rejection_is_final() {
        use ProjectStatus::*;
        assert!(!Rejected.can_transition_to(Active));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn rejecting_requires_a_reason() {
        let err = ProjectStatus::Pending
            .validate_transition(ProjectStatus::Rejected, Some("   "))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert!(ProjectStatus::Active
            .validate_transition(ProjectStatus::Rejected, None)
            .is_err());
        assert!(ProjectStatus::Active
            .validate_transition(ProjectStatus::Rejected, Some("off-topic"))
            .is_ok());
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let err = ProjectPatch::approve()
            .validate_against(ProjectStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Active,
            ProjectStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn category_parsing_and_labels() {
        assert_eq!("health".parse::<Category>().unwrap(), Category::Health);
        assert!("".parse::<Category>().is_err());
        assert!("Environment".parse::<Category>().is_err());
        assert_eq!(category_label("environment"), "Umwelt & Natur");
        assert_eq!(category_label("sports"), "sports");
    }

    #[test]
    fn active_projects_are_visible_to_everyone() {
        let p = project(ProjectStatus::Active, "device-a");
        assert!(p.is_visible_to(&DeviceId::from("device-b")));
    }

    #[test]
    fn rejected_projects_are_visible_only_to_their_owner() {
        let p = project(ProjectStatus::Rejected, "device-a");
        assert!(p.is_visible_to(&DeviceId::from("device-a")));
        assert!(!p.is_visible_to(&DeviceId::from("device-b")));
    }

    #[test]
    fn pending_projects_are_never_public() {
        let p = project(ProjectStatus::Pending, "device-a");
        assert!(!p.is_visible_to(&DeviceId::from("device-a")));
    }

    #[test]
    fn order_by_votes_desc_is_stable() {
        let mut a = project(ProjectStatus::Active, "x");
        a.id = 1;
        a.votes = 5;
        let mut b = project(ProjectStatus::Active, "x");
        b.id = 2;
        b.votes = 9;
        let mut c = project(ProjectStatus::Active, "x");
        c.id = 3;
        c.votes = 5;

        let mut list = vec![a, b, c];
        ProjectOrder::MOST_VOTES.sort(&mut list);
        let ids: Vec<_> = list.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
