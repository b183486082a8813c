//! Selection store for one wizard session.
//!
//! The store owns the session's [`Selection`] and the status of the last
//! submission. Every change goes through [`Wizard::apply`]; callers only get
//! read access to the selection.

use crate::catalog::CatalogProvider;
use crate::error::{BookingError, BookingResult};
use crate::models::{BookingKind, TimeGrid};
use crate::selection::Selection;
use crate::submitter::{BookingConfirmation, BookingPayload, BookingSubmitter};
use crate::wizard::{can_confirm, reset, Wizard, WizardAction};

/// Where the last confirm attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Pending,
    Succeeded(BookingConfirmation),
    Failed(String),
}

pub struct SelectionStore<C> {
    wizard: Wizard<C>,
    selection: Selection,
    status: SubmissionStatus,
}

impl<C: CatalogProvider> SelectionStore<C> {
    /// Start a session of `kind`.
    pub fn new(catalog: C, grid: TimeGrid, kind: BookingKind) -> Self {
        SelectionStore {
            wizard: Wizard::new(catalog, grid),
            selection: reset(kind),
            status: SubmissionStatus::Idle,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn wizard(&self) -> &Wizard<C> {
        &self.wizard
    }

    pub fn catalog(&self) -> &C {
        self.wizard.catalog()
    }

    pub fn can_confirm(&self) -> bool {
        can_confirm(&self.selection)
    }

    /// Apply a user action. Returns whether the selection changed.
    pub fn dispatch(&mut self, action: WizardAction) -> bool {
        if !matches!(self.status, SubmissionStatus::Idle | SubmissionStatus::Pending) {
            self.status = SubmissionStatus::Idle;
        }

        let next = self.wizard.apply(&self.selection, action);
        let changed = next != self.selection;
        self.selection = next;
        changed
    }

    /// Submit the current selection.
    ///
    /// On success the session starts over with the same kind. On failure the
    /// selection is kept so the user can retry without re-entering choices.
    pub fn confirm<S: BookingSubmitter + ?Sized>(
        &mut self,
        submitter: &mut S,
    ) -> BookingResult<BookingConfirmation> {
        if !self.can_confirm() {
            return Err(BookingError::NotReady(self.selection.kind()));
        }

        let payload = BookingPayload::from_selection(&self.selection)?;
        self.status = SubmissionStatus::Pending;
        tracing::info!(kind = %payload.kind(), summary = %payload.summary(), "submitting booking");

        match submitter.submit(&payload) {
            Ok(confirmation) => {
                self.selection = reset(self.selection.kind());
                self.status = SubmissionStatus::Succeeded(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                tracing::warn!(error = %e, "booking submission failed");
                self.status = SubmissionStatus::Failed(e.to_string());
                Err(e.into())
            }
        }
    }
}
