//! Batch curation workflow.
//!
//! Manages a selection set over one curated collection (pending queue or
//! trash) and runs the four batch actions through an explicit state machine:
//! idle → confirming → processing → idle, with failures landing back in idle
//! carrying an error message and an intact selection for retry.

use std::sync::Arc;

use crate::models::Listing;
use crate::sync::engine::SYNC_ERROR_MESSAGE;
use crate::sync::remote::{CurationAction, CurationQueue, RemoteCatalog, RemoteError};

/// Workflow phase. "Idle with error" is `Idle` plus a set `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurationPhase {
    #[default]
    Idle,
    Confirming,
    Processing,
}

/// An action awaiting user confirmation.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: CurationAction,
    pub ids: Vec<String>,
}

pub struct CurationWorkflow<R: RemoteCatalog> {
    remote: Arc<R>,
    queue: CurationQueue,
    is_admin: bool,
    items: Vec<Listing>,
    selection: Vec<String>,
    phase: CurationPhase,
    pending: Option<PendingAction>,
    last_error: Option<String>,
}

/// Which actions belong to which collection.
fn action_allowed(queue: CurationQueue, action: CurationAction) -> bool {
    match queue {
        CurationQueue::Pending => {
            matches!(action, CurationAction::Approve | CurationAction::Reject)
        }
        CurationQueue::Trash => {
            matches!(action, CurationAction::Restore | CurationAction::Delete)
        }
    }
}

impl<R: RemoteCatalog> CurationWorkflow<R> {
    pub fn new(remote: Arc<R>, queue: CurationQueue, is_admin: bool) -> Self {
        Self {
            remote,
            queue,
            is_admin,
            items: Vec::new(),
            selection: Vec::new(),
            phase: CurationPhase::Idle,
            pending: None,
            last_error: None,
        }
    }

    /// Load (or reload) the curated collection. The selection is pruned to
    /// ids that still exist.
    pub async fn load(&mut self) -> Result<(), RemoteError> {
        let items = self.remote.fetch_queue(self.queue).await?;
        self.selection
            .retain(|id| items.iter().any(|l| &l.id == id));
        self.items = items;
        Ok(())
    }

    /// Toggle one listing in the selection. Ignored for non-administrators
    /// and while a batch action is in flight.
    pub fn toggle(&mut self, id: &str) {
        if !self.is_admin || self.phase == CurationPhase::Processing {
            return;
        }
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
        } else if self.items.iter().any(|l| l.id == id) {
            self.selection.push(id.to_string());
        }
    }

    /// Toggle between the empty selection and the full visible set.
    pub fn toggle_select_all(&mut self) {
        if !self.is_admin || self.phase == CurationPhase::Processing {
            return;
        }
        if self.selection.len() == self.items.len() {
            self.selection.clear();
        } else {
            self.selection = self.items.iter().map(|l| l.id.clone()).collect();
        }
    }

    pub fn clear_selection(&mut self) {
        if self.phase == CurationPhase::Processing {
            return;
        }
        self.selection.clear();
    }

    /// Stage an action for confirmation. `override_ids` serves the inline
    /// single-card buttons; otherwise the current selection is taken.
    ///
    /// Returns whether the workflow moved to `Confirming`.
    pub fn request(&mut self, action: CurationAction, override_ids: Option<&[String]>) -> bool {
        if !self.is_admin
            || self.phase != CurationPhase::Idle
            || !action_allowed(self.queue, action)
        {
            return false;
        }
        let ids: Vec<String> = match override_ids {
            Some(ids) => ids.to_vec(),
            None => self.selection.clone(),
        };
        if ids.is_empty() {
            return false;
        }
        self.pending = Some(PendingAction { action, ids });
        self.phase = CurationPhase::Confirming;
        true
    }

    /// Back out of the confirmation dialog.
    pub fn cancel(&mut self) {
        if self.phase == CurationPhase::Confirming {
            self.pending = None;
            self.phase = CurationPhase::Idle;
        }
    }

    /// Run the staged action. On success the selection is cleared and the
    /// collection reloaded; on failure both survive untouched for retry.
    ///
    /// Returns whether the batch succeeded.
    pub async fn confirm(&mut self) -> bool {
        if self.phase != CurationPhase::Confirming {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            self.phase = CurationPhase::Idle;
            return false;
        };

        self.phase = CurationPhase::Processing;
        self.last_error = None;

        match self.remote.batch(pending.action, &pending.ids).await {
            Ok(()) => {
                self.selection.clear();
                if let Err(e) = self.load().await {
                    tracing::warn!("Reload after batch action failed: {}", e);
                    self.last_error = Some(SYNC_ERROR_MESSAGE.to_string());
                }
                self.phase = CurationPhase::Idle;
                true
            }
            Err(e) => {
                tracing::warn!("Batch {} failed: {}", pending.action.as_str(), e);
                self.last_error = Some(SYNC_ERROR_MESSAGE.to_string());
                self.phase = CurationPhase::Idle;
                false
            }
        }
    }

    pub fn phase(&self) -> CurationPhase {
        self.phase
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
