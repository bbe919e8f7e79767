//! Debounced autosave for the note being edited.
//!
//! Every field edit restarts a timer. When the timer runs out without
//! another edit, the accumulated patch becomes due as one write. Switching
//! notes or closing the editor flushes whatever is pending immediately, so
//! nothing typed is lost.

use std::time::Duration;

use jotpad_core::note::NotePatch;
use jotpad_core::types::EntityId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A single field change from the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Title(String),
    Content(String),
    Category(Option<EntityId>),
}

impl FieldEdit {
    fn into_patch(self) -> NotePatch {
        match self {
            FieldEdit::Title(title) => NotePatch::default().with_title(title),
            FieldEdit::Content(content) => NotePatch::default().with_content(content),
            FieldEdit::Category(category) => NotePatch::default().with_category(category),
        }
    }
}

/// A write the coordinator wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub note_id: EntityId,
    pub patch: NotePatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    PendingWrite,
}

/// A running debounce timer. Dropping it cancels the timer.
struct Timer {
    generation: u64,
    cancel: CancellationToken,
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct AutosaveCoordinator {
    delay: Duration,
    note_id: Option<EntityId>,
    pending: Option<NotePatch>,
    timer: Option<Timer>,
    generation: u64,
    fired_tx: mpsc::UnboundedSender<u64>,
    fired_rx: mpsc::UnboundedReceiver<u64>,
}

impl AutosaveCoordinator {
    pub fn new(delay: Duration) -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        Self {
            delay,
            note_id: None,
            pending: None,
            timer: None,
            generation: 0,
            fired_tx,
            fired_rx,
        }
    }

    pub fn state(&self) -> AutosaveState {
        if self.pending.is_some() {
            AutosaveState::PendingWrite
        } else {
            AutosaveState::Idle
        }
    }

    /// The note the editor has open.
    pub fn note_id(&self) -> Option<EntityId> {
        self.note_id
    }

    /// Start editing `note_id`, returning the previous note's pending write
    /// if there is one.
    pub fn open(&mut self, note_id: EntityId) -> Option<PendingWrite> {
        let flushed = self.flush();
        self.note_id = Some(note_id);
        flushed
    }

    /// Stop editing, returning any pending write.
    pub fn close(&mut self) -> Option<PendingWrite> {
        let flushed = self.flush();
        self.note_id = None;
        flushed
    }

    /// Drop pending edits without writing them (the note is gone).
    pub fn discard(&mut self) {
        self.timer = None;
        self.pending = None;
        self.note_id = None;
    }

    /// Record an edit and restart the debounce timer. Edits with no note
    /// open are ignored.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn edit(&mut self, edit: FieldEdit) {
        if self.note_id.is_none() {
            tracing::debug!("Edit with no open note, ignoring");
            return;
        }
        self.pending
            .get_or_insert_with(NotePatch::default)
            .merge(edit.into_patch());
        self.restart_timer();
    }

    /// Take the pending write now, cancelling the timer.
    pub fn flush(&mut self) -> Option<PendingWrite> {
        self.timer = None;
        let patch = self.pending.take()?;
        let note_id = self.note_id?;
        Some(PendingWrite { note_id, patch })
    }

    /// Wait until the debounce timer runs out and return the write that is
    /// now due. Pends forever while idle.
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` loop.
    pub async fn next_due(&mut self) -> PendingWrite {
        loop {
            let Some(generation) = self.fired_rx.recv().await else {
                // We hold a sender, so the channel never closes.
                return std::future::pending().await;
            };
            let current = self.timer.as_ref().map(|t| t.generation);
            if current != Some(generation) {
                tracing::trace!(generation, "Discarding superseded autosave timer");
                continue;
            }
            if let Some(write) = self.flush() {
                return write;
            }
        }
    }

    fn restart_timer(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let delay = self.delay;
        let fired = self.fired_tx.clone();
        let token = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = fired.send(generation);
                }
            }
        });

        // Replacing the old timer cancels it.
        self.timer = Some(Timer { generation, cancel });
    }
}
