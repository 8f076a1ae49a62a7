use gridstream_common::ContentLoader;

use crate::settings::GridSettings;
use crate::stats::GridStats;
use crate::store::{GridAuthoringStore, SafeSaveReport, SaveReport};
use crate::AuthorError;

/// A reversible edit to the authoring state.
///
/// Each command carries enough context to undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Set a cell's validity. Undo = restore `old`.
    SetValidity { index: usize, old: bool, new: bool },
    /// Replace the grid settings. Undo = restore `old` and the validity
    /// flags captured before the change.
    ChangeSettings {
        old: GridSettings,
        new: GridSettings,
        old_validity: Vec<bool>,
    },
}

impl EditCommand {
    fn apply(&self, store: &mut GridAuthoringStore) -> Result<(), AuthorError> {
        match self {
            Self::SetValidity { index, new, .. } => {
                store.set_cell_valid(*index, *new)?;
            }
            Self::ChangeSettings { new, .. } => store.set_settings(*new)?,
        }
        Ok(())
    }

    fn revert(&self, store: &mut GridAuthoringStore) -> Result<(), AuthorError> {
        match self {
            Self::SetValidity { index, old, .. } => {
                store.set_cell_valid(*index, *old)?;
            }
            Self::ChangeSettings {
                old, old_validity, ..
            } => {
                store.set_settings(*old)?;
                store.restore_validity(old_validity);
            }
        }
        Ok(())
    }
}

/// Commands an authoring front end can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthoringCommand {
    RecomputeGrid,
    UpdateSettings(GridSettings),
    ToggleCell(usize),
    Save,
    OverwriteAll,
    SafeSave,
}

/// What an executed [`AuthoringCommand`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Recomputed(GridStats),
    SettingsUpdated(GridStats),
    Toggled { index: usize, valid: bool },
    Saved(SaveReport),
    SafeSaved(SafeSaveReport),
}

/// Runs authoring commands against a [`GridAuthoringStore`], keeping
/// undo/redo stacks for the reversible ones.
///
/// Saves are not reversible and leave the stacks alone.
#[derive(Debug, Default)]
pub struct Editor {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one command. `loader` is only used by overwrite-all, which
    /// unloads editor content before deleting it.
    pub fn execute(
        &mut self,
        store: &mut GridAuthoringStore,
        command: AuthoringCommand,
        loader: &mut dyn ContentLoader,
    ) -> Result<CommandOutcome, AuthorError> {
        match command {
            AuthoringCommand::RecomputeGrid => {
                store.recompute();
                Ok(CommandOutcome::Recomputed(*store.stats()))
            }
            AuthoringCommand::UpdateSettings(settings) => {
                self.change_settings(store, settings)?;
                Ok(CommandOutcome::SettingsUpdated(*store.stats()))
            }
            AuthoringCommand::ToggleCell(index) => {
                let valid = self.toggle_cell(store, index)?;
                Ok(CommandOutcome::Toggled { index, valid })
            }
            AuthoringCommand::Save => Ok(CommandOutcome::Saved(store.save()?)),
            AuthoringCommand::OverwriteAll => Ok(CommandOutcome::Saved(store.overwrite_all(loader)?)),
            AuthoringCommand::SafeSave => Ok(CommandOutcome::SafeSaved(store.safe_save()?)),
        }
    }

    /// Flip a cell's validity and push to undo stack. Returns the new value.
    pub fn toggle_cell(&mut self, store: &mut GridAuthoringStore, index: usize) -> Result<bool, AuthorError> {
        let old = store.cell(index)?.valid;
        self.push(store, EditCommand::SetValidity { index, old, new: !old })?;
        Ok(!old)
    }

    /// Replace the grid settings and push to undo stack.
    pub fn change_settings(
        &mut self,
        store: &mut GridAuthoringStore,
        settings: GridSettings,
    ) -> Result<(), AuthorError> {
        let command = EditCommand::ChangeSettings {
            old: *store.settings(),
            new: settings.clamped(),
            old_validity: store.validity(),
        };
        self.push(store, command)
    }

    fn push(&mut self, store: &mut GridAuthoringStore, command: EditCommand) -> Result<(), AuthorError> {
        command.apply(store)?;
        self.undo_stack.push(command);
        self.redo_stack.clear();
        Ok(())
    }

    /// Undo the last edit. Returns true if an operation was undone.
    pub fn undo(&mut self, store: &mut GridAuthoringStore) -> Result<bool, AuthorError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        command.revert(store)?;
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redo the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self, store: &mut GridAuthoringStore) -> Result<bool, AuthorError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        command.apply(store)?;
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
