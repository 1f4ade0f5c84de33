//! # Edit Session
//!
//! An admin's private working copy of one page. Commands are applied in the
//! order given, each onto the page the previous one produced. Nothing reaches
//! the store until `commit`; `discard` reverts to the loaded page.

use crate::documents::PageRepo;
use crate::edit::{self, ImportFormat, ModePatch, OptionGroupPatch, OptionPatch, PagePatch};
use crate::error::{AppError, Result};
use crate::models::{EntityRef, PageData};
use serde::{Deserialize, Serialize};

/// One admin edit, as sent by the manage UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditCommand {
    NewMode {
        name: String,
    },
    NewOptionGroup {
        name: String,
        #[serde(default)]
        mode: Option<String>,
    },
    NewOption {
        name: String,
        #[serde(default)]
        tooltip: Option<String>,
        #[serde(default)]
        group: Option<String>,
    },
    EditPage {
        patch: PagePatch,
    },
    EditMode {
        id: String,
        patch: ModePatch,
    },
    EditOptionGroup {
        id: String,
        patch: OptionGroupPatch,
    },
    EditOption {
        id: String,
        patch: OptionPatch,
    },
    ToggleDeletion {
        target: EntityRef,
    },
    ToggleGroupIncluded {
        mode: String,
        group: String,
    },
    ToggleOptionIncluded {
        group: String,
        option: String,
    },
    ImportOptions {
        text: String,
        #[serde(default)]
        format: ImportFormat,
        #[serde(default)]
        group: Option<String>,
    },
}

pub struct EditSession {
    original: PageData,
    working: PageData,
    has_changes: bool,
}

impl EditSession {
    pub fn new(page: PageData) -> Self {
        Self {
            working: page.clone(),
            original: page,
            has_changes: false,
        }
    }

    pub fn page(&self) -> &PageData {
        &self.working
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Applies one command. Returns the ids of any entities it created.
    pub fn apply(&mut self, command: EditCommand) -> Result<Vec<String>> {
        let page = &self.working;
        let (next, created) = match command {
            EditCommand::NewMode { name } => {
                let (next, mode) = edit::new_mode(page, &name);
                (next, vec![mode.id.clone()])
            }
            EditCommand::NewOptionGroup { name, mode } => {
                let (next, group) = edit::new_option_group(page, &name, mode.as_deref());
                (next, vec![group.id.clone()])
            }
            EditCommand::NewOption { name, tooltip, group } => {
                let (next, option) = edit::new_option(page, &name, tooltip.as_deref(), group.as_deref());
                (next, vec![option.id.clone()])
            }
            EditCommand::EditPage { patch } => {
                if let Some(root) = patch.root.as_deref() {
                    if root.trim().is_empty() {
                        return Err(AppError::ValidationError("page URL cannot be empty".into()));
                    }
                    if !edit::is_valid_root(root) {
                        return Err(AppError::ValidationError(format!(
                            "page URL {root:?} may only use letters, digits, '_' and '-'"
                        )));
                    }
                }
                (edit::edit_page(page, patch), Vec::new())
            }
            EditCommand::EditMode { id, patch } => (edit::edit_mode(page, &id, patch), Vec::new()),
            EditCommand::EditOptionGroup { id, patch } => (edit::edit_option_group(page, &id, patch), Vec::new()),
            EditCommand::EditOption { id, patch } => (edit::edit_option(page, &id, patch), Vec::new()),
            EditCommand::ToggleDeletion { target } => {
                if page.is_deleted(&target).is_none() {
                    return Err(AppError::NotFound(target.kind().into(), target.id().into()));
                }
                if !edit::can_toggle_deletion(page, &target) {
                    return Err(AppError::Conflict(format!(
                        "cannot delete the last {} left",
                        target.kind()
                    )));
                }
                (edit::toggle_deletion(page, &target), Vec::new())
            }
            EditCommand::ToggleGroupIncluded { mode, group } => {
                (edit::toggle_group_included(page, &mode, &group), Vec::new())
            }
            EditCommand::ToggleOptionIncluded { group, option } => {
                (edit::toggle_option_included(page, &group, &option), Vec::new())
            }
            EditCommand::ImportOptions { text, format, group } => {
                let (next, options) = edit::import_options(page, &text, format, group.as_deref());
                (next, options.iter().map(|o| o.id.clone()).collect())
            }
        };

        self.working = next;
        self.has_changes = true;
        Ok(created)
    }

    /// Applies `commands` in order, stopping at the first rejected one.
    /// Commands before the rejected one stay applied.
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = EditCommand>) -> Result<Vec<String>> {
        let mut created = Vec::new();
        for command in commands {
            created.extend(self.apply(command)?);
        }
        Ok(created)
    }

    /// Drops every change since loading or the last commit.
    pub fn discard(&mut self) {
        self.working = self.original.clone();
        self.has_changes = false;
    }

    /// Persists the working copy. Deleted entities are purged from the store
    /// and from the session.
    pub async fn commit(&mut self, repo: &PageRepo) -> Result<()> {
        repo.write_page(&self.working).await?;
        self.working = self.working.without_deleted();
        self.original = self.working.clone();
        self.has_changes = false;
        Ok(())
    }
}
