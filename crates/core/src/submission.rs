//! Step-gated submission form (guidelines, idea, impact, identity, review).
//!
//! The form state is explicit: the current step, an immutable draft value
//! that is replaced on every edit, the field error map, and the submit
//! phase. The same field rules are exposed through [`validate_new_project`]
//! so the API applies them to direct submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::IdentityProvider;
use crate::project::{Category, NewProject, Project};
use crate::store::ProjectStore;
use crate::types::DeviceId;

/// Minimum trimmed length of a title, in characters.
pub const MIN_TITLE_CHARS: usize = 3;

/// Minimum trimmed length of a description, in characters.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Minimum trimmed length of the social benefit text, in characters.
pub const MIN_BENEFIT_CHARS: usize = 10;

/// Minimum trimmed length of a display name, in characters.
pub const MIN_USERNAME_CHARS: usize = 3;

/// Avatars offered on the identity step.
pub const AVATAR_CHOICES: [&str; 4] = ["avatar-1", "avatar-2", "avatar-3", "avatar-4"];

/// Avatar preselected on a new draft.
pub const DEFAULT_AVATAR: &str = "avatar-1";

/// Message shown when the store rejected or failed a submission.
pub const SUBMIT_FAILED_MESSAGE: &str = "Something went wrong while submitting. Please try again.";

/// Message shown when no store is configured.
pub const NOT_CONNECTED_MESSAGE: &str =
    "The idea board is not connected right now. Please try again later.";

// ---------------------------------------------------------------------------
// Steps and fields
// ---------------------------------------------------------------------------

/// The five steps of the submission wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    Guidelines,
    Idea,
    Impact,
    Identity,
    Review,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 5;

impl FormStep {
    /// Convert a 1-based step number to a `FormStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::Guidelines),
            2 => Ok(Self::Idea),
            3 => Ok(Self::Impact),
            4 => Ok(Self::Identity),
            5 => Ok(Self::Review),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between 1 and {TOTAL_STEPS}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::Guidelines => 1,
            Self::Idea => 2,
            Self::Impact => 3,
            Self::Identity => 4,
            Self::Review => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Guidelines => "Guidelines",
            Self::Idea => "The Idea",
            Self::Impact => "Impact",
            Self::Identity => "Identity",
            Self::Review => "Review",
        }
    }

    /// The following step, capped at [`FormStep::Review`].
    pub fn next(self) -> Self {
        Self::from_number(self.to_number() + 1).unwrap_or(Self::Review)
    }

    /// The preceding step, floored at [`FormStep::Guidelines`].
    pub fn previous(self) -> Self {
        Self::from_number(self.to_number().saturating_sub(1)).unwrap_or(Self::Guidelines)
    }
}

/// Validated form fields. The avatar always has a value and is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Agreed,
    Title,
    Category,
    Description,
    Benefit,
    Username,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agreed => "agreed",
            Self::Title => "title",
            Self::Category => "category",
            Self::Description => "description",
            Self::Benefit => "benefit",
            Self::Username => "username",
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Everything entered so far, across all steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub agreed: bool,
    pub title: String,
    /// Raw category key as selected; empty until the user picks one.
    pub category: String,
    pub description: String,
    pub benefit: String,
    pub username: String,
    pub avatar: String,
}

impl Default for SubmissionDraft {
    fn default() -> Self {
        Self {
            agreed: false,
            title: String::new(),
            category: String::new(),
            description: String::new(),
            benefit: String::new(),
            username: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Agreed(bool),
    Title(String),
    Category(String),
    Description(String),
    Benefit(String),
    Username(String),
    Avatar(String),
}

impl FieldEdit {
    /// The validated field this edit touches.
    pub fn field(&self) -> Option<FormField> {
        match self {
            Self::Agreed(_) => Some(FormField::Agreed),
            Self::Title(_) => Some(FormField::Title),
            Self::Category(_) => Some(FormField::Category),
            Self::Description(_) => Some(FormField::Description),
            Self::Benefit(_) => Some(FormField::Benefit),
            Self::Username(_) => Some(FormField::Username),
            Self::Avatar(_) => None,
        }
    }
}

impl SubmissionDraft {
    /// Return a new draft with `edit` applied.
    pub fn with(self, edit: FieldEdit) -> Self {
        match edit {
            FieldEdit::Agreed(agreed) => Self { agreed, ..self },
            FieldEdit::Title(title) => Self { title, ..self },
            FieldEdit::Category(category) => Self { category, ..self },
            FieldEdit::Description(description) => Self {
                description,
                ..self
            },
            FieldEdit::Benefit(benefit) => Self { benefit, ..self },
            FieldEdit::Username(username) => Self { username, ..self },
            FieldEdit::Avatar(avatar) => Self { avatar, ..self },
        }
    }

    /// Build the creation request for this draft, owned by `owner`.
    ///
    /// Text fields are trimmed; an empty avatar falls back to the default.
    pub fn to_new_project(&self, owner: DeviceId) -> Result<NewProject, CoreError> {
        let category: Category = self.category.parse()?;
        let avatar = self.avatar.trim();
        Ok(NewProject {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            benefit: self.benefit.trim().to_string(),
            category,
            username: self.username.trim().to_string(),
            avatar_seed: if avatar.is_empty() {
                DEFAULT_AVATAR.to_string()
            } else {
                avatar.to_string()
            },
            owner_id: owner,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Field -> message map produced by step validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn insert(&mut self, field: FormField, message: &str) {
        self.0.insert(field, message.to_string());
    }

    fn remove(&mut self, field: FormField) {
        self.0.remove(&field);
    }
}

fn has_min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Validate the fields belonging to `step`.
///
/// The review step has no fields of its own and always passes.
pub fn validate_step(step: FormStep, draft: &SubmissionDraft) -> FieldErrors {
    let mut errors = FieldErrors::default();
    match step {
        FormStep::Guidelines => {
            if !draft.agreed {
                errors.insert(
                    FormField::Agreed,
                    "You must agree to the guidelines to proceed.",
                );
            }
        }
        FormStep::Idea => {
            if !has_min_chars(&draft.title, MIN_TITLE_CHARS) {
                errors.insert(FormField::Title, "Title must be at least 3 characters.");
            }
            if draft.category.parse::<Category>().is_err() {
                errors.insert(FormField::Category, "Please select a category.");
            }
            if !has_min_chars(&draft.description, MIN_DESCRIPTION_CHARS) {
                errors.insert(
                    FormField::Description,
                    "Description must be at least 10 characters.",
                );
            }
        }
        FormStep::Impact => {
            if !has_min_chars(&draft.benefit, MIN_BENEFIT_CHARS) {
                errors.insert(
                    FormField::Benefit,
                    "Please explain the social benefit (min. 10 chars).",
                );
            }
        }
        FormStep::Identity => {
            if !has_min_chars(&draft.username, MIN_USERNAME_CHARS) {
                errors.insert(
                    FormField::Username,
                    "Username must be at least 3 characters.",
                );
            }
        }
        FormStep::Review => {}
    }
    errors
}

/// Apply the form's field rules to a creation request.
pub fn validate_new_project(project: &NewProject) -> Result<(), CoreError> {
    let mut problems = Vec::new();
    if !has_min_chars(&project.title, MIN_TITLE_CHARS) {
        problems.push("title must be at least 3 characters");
    }
    if !has_min_chars(&project.description, MIN_DESCRIPTION_CHARS) {
        problems.push("description must be at least 10 characters");
    }
    if !has_min_chars(&project.benefit, MIN_BENEFIT_CHARS) {
        problems.push("benefit must be at least 10 characters");
    }
    if !has_min_chars(&project.username, MIN_USERNAME_CHARS) {
        problems.push("username must be at least 3 characters");
    }
    if project.avatar_seed.trim().is_empty() {
        problems.push("avatar_seed must not be empty");
    }
    if project.owner_id.as_str().trim().is_empty() {
        problems.push("owner_id must not be empty");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

// ---------------------------------------------------------------------------
// Form state machine
// ---------------------------------------------------------------------------

/// Submission progress of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    /// Terminal: the project was created.
    Submitted(Project),
    /// The last submit failed; the message is safe to show to the user.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SubmissionForm {
    step: FormStep,
    draft: SubmissionDraft,
    errors: FieldErrors,
    phase: FormPhase,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self {
            step: FormStep::Guidelines,
            draft: SubmissionDraft::default(),
            errors: FieldErrors::default(),
            phase: FormPhase::Editing,
        }
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, FormPhase::Submitted(_))
    }

    /// Apply an edit and clear that field's error. Ignored once submitted.
    pub fn edit(&mut self, edit: FieldEdit) {
        if self.is_submitted() {
            return;
        }
        if let Some(field) = edit.field() {
            self.errors.remove(field);
        }
        self.draft = std::mem::take(&mut self.draft).with(edit);
    }

    /// Validate the current step and advance on success.
    ///
    /// Returns whether the step passed validation.
    pub fn next(&mut self) -> bool {
        if self.is_submitted() {
            return false;
        }
        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            self.errors = errors;
            return false;
        }
        self.errors = FieldErrors::default();
        self.step = self.step.next();
        true
    }

    /// Go back one step without validating.
    pub fn back(&mut self) {
        if !self.is_submitted() {
            self.step = self.step.previous();
        }
    }

    /// Discard everything and start over at step 1.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Submit the draft from the review step.
    ///
    /// All steps are re-validated first; on a validation failure the form
    /// jumps back to the first failing step. A store failure leaves the form
    /// on the review step in [`FormPhase::Failed`] so the user can retry.
    /// Retrying is not idempotent: if the first attempt reached the store
    /// before failing, a second project may be created.
    pub async fn submit(
        &mut self,
        store: Option<&dyn ProjectStore>,
        identity: &dyn IdentityProvider,
    ) -> Result<Project, CoreError> {
        if self.is_submitted() {
            return Err(CoreError::Conflict(
                "This idea has already been submitted".to_string(),
            ));
        }
        if self.step != FormStep::Review {
            return Err(CoreError::Validation(format!(
                "Submission is only possible from the review step (currently on step {})",
                self.step.to_number()
            )));
        }

        for step in [
            FormStep::Guidelines,
            FormStep::Idea,
            FormStep::Impact,
            FormStep::Identity,
        ] {
            let errors = validate_step(step, &self.draft);
            if !errors.is_empty() {
                self.step = step;
                self.errors = errors;
                return Err(CoreError::Validation(format!(
                    "Step {} ({}) is incomplete",
                    step.to_number(),
                    step.label()
                )));
            }
        }

        let Some(store) = store else {
            tracing::warn!("Submission attempted without a configured store");
            self.phase = FormPhase::Failed(NOT_CONNECTED_MESSAGE.to_string());
            return Err(CoreError::Unavailable("No project store configured".to_string()));
        };

        let request = self.draft.to_new_project(identity.device_id())?;
        match store.insert(&request).await {
            Ok(project) => {
                tracing::info!(project_id = project.id, "Project submitted for review");
                self.phase = FormPhase::Submitted(project.clone());
                Ok(project)
            }
            Err(e) => {
                tracing::error!(error = %e, "Project submission failed");
                self.phase = FormPhase::Failed(SUBMIT_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}
