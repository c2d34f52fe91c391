//! Generation-guarded panel orchestration.
//!
//! Each Apply starts a new run: the panel board is rebuilt from scratch and
//! every fetch dispatched for the run carries the run's generation. A result
//! is only folded into the board if its generation is still current, so a
//! slow response to an older query can never overwrite fresher state.

use dashboard_types::QuerySnapshot;

use super::derive::derive_panels;
use super::state::{FetchOutcome, PanelBoard, PanelKind, apply_result};

/// A fetch the caller must perform for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub generation: u64,
    pub field: String,
    pub kind: PanelKind,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Written into the board
    Applied,
    /// Belonged to an older run and was dropped
    Stale,
}

/// Owns the generation counter and the panel board.
///
/// Nothing else writes either; readers get `&PanelBoard` or a clone.
#[derive(Debug, Default)]
pub struct PanelOrchestrator {
    generation: u64,
    board: PanelBoard,
}

impl PanelOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn board(&self) -> &PanelBoard {
        &self.board
    }

    /// Start a run for `snapshot` and return the fetches to dispatch.
    ///
    /// With no active panels the board is cleared and nothing is dispatched;
    /// the generation does not move. Otherwise the generation is bumped, the
    /// board is replaced with fresh loading state, and one ticket is issued per
    /// requested (field, kind) pair, tables before charts within each field.
    pub fn on_snapshot_change(&mut self, snapshot: &QuerySnapshot) -> Vec<FetchTicket> {
        let panels = derive_panels(snapshot);
        if panels.is_empty() {
            tracing::debug!("[PANELS] No active panels, clearing board");
            self.board = PanelBoard::cleared(self.generation);
            return Vec::new();
        }

        self.generation += 1;
        let generation = self.generation;

        let mut tickets = Vec::with_capacity(panels.len() * 2);
        for panel in &panels {
            if panel.wants_table {
                tickets.push(FetchTicket {
                    generation,
                    field: panel.field.clone(),
                    kind: PanelKind::Table,
                });
            }
            if panel.wants_chart {
                tickets.push(FetchTicket {
                    generation,
                    field: panel.field.clone(),
                    kind: PanelKind::Chart,
                });
            }
        }

        tracing::info!(
            "[PANELS] Run {} started: {} panels, {} fetches",
            generation,
            panels.len(),
            tickets.len()
        );
        self.board = PanelBoard::initial(generation, panels);
        tickets
    }

    /// Whether a ticket still belongs to the current run
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Fold a completed fetch into the board if its run is still current.
    pub fn reconcile(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> Reconciled {
        if !self.is_current(ticket) {
            tracing::debug!(
                "[PANELS] Discarding stale {} result for '{}' (gen {} < {})",
                ticket.kind,
                ticket.field,
                ticket.generation,
                self.generation
            );
            return Reconciled::Stale;
        }
        debug_assert_eq!(ticket.kind, outcome.kind());

        match &outcome {
            FetchOutcome::Table(Err(err)) => {
                tracing::warn!("[PANELS] Table fetch failed for {}: {}", ticket.field, err);
            }
            FetchOutcome::Chart(Err(err)) => {
                tracing::warn!("[PANELS] Chart fetch failed for {}: {}", ticket.field, err);
            }
            _ => {}
        }

        let board = std::mem::take(&mut self.board);
        self.board = apply_result(board, &ticket.field, outcome);
        Reconciled::Applied
    }
}
