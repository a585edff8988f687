//! Draft mode for multi-field forms.
//!
//! A draft copies the settings when a form opens, collects edits on the copy
//! and turns the edited sections into a single command when committed.

use super::command::{Patch, Section, SectionSnapshot};
use crate::models::SettingsTree;

/// Edits pending in an open form.
#[derive(Debug, Clone)]
pub struct Draft {
    form_id: String,
    sections: Vec<Section>,
    original: SettingsTree,
    working: SettingsTree,
    has_changes: bool,
}

impl Draft {
    /// Opens a draft of `sections` for `form_id`, starting from `tree`.
    pub fn start(form_id: impl Into<String>, sections: &[Section], tree: &SettingsTree) -> Self {
        let mut sections = sections.to_vec();
        sections.sort();
        sections.dedup();
        Self {
            form_id: form_id.into(),
            sections,
            original: tree.clone(),
            working: tree.clone(),
            has_changes: false,
        }
    }

    /// Form owning the draft.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Sections covered by the draft.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The working copy.
    pub const fn tree(&self) -> &SettingsTree {
        &self.working
    }

    /// Edits the working copy. Changes outside the drafted sections are
    /// discarded on commit.
    pub fn update(&mut self, edit: impl FnOnce(&mut SettingsTree)) {
        edit(&mut self.working);
        self.has_changes = !self.changed_sections().is_empty();
    }

    /// Whether any drafted section differs from when the draft opened.
    pub const fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Patches replacing every changed drafted section with its draft value.
    pub fn into_patches(self) -> Vec<Patch> {
        self.changed_sections()
            .into_iter()
            .map(|section| Patch::Section(SectionSnapshot::capture(&self.working, section)))
            .collect()
    }

    fn changed_sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .copied()
            .filter(|section| {
                SectionSnapshot::capture(&self.original, *section)
                    != SectionSnapshot::capture(&self.working, *section)
            })
            .collect()
    }
}
