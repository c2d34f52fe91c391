//! Async driver: runs orchestrator tickets against a [`FetchGateway`].
//!
//! Everything lives on one thread. Fetches are spawned with
//! [`tokio::task::spawn_local`], so the driver must be used from inside a
//! [`tokio::task::LocalSet`]. Orchestrator state sits in a `RefCell` that is
//! never borrowed across an `.await`.
//!
//! Starting a run aborts the fetch tasks of the previous one, so superseded
//! requests give their concurrency permits back right away. The generation
//! check still decides what reaches the board.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dashboard_types::QuerySnapshot;
use tokio::sync::{Semaphore, watch};
use tokio::task::{AbortHandle, JoinHandle};

use super::orchestrator::{FetchTicket, PanelOrchestrator, Reconciled};
use super::state::{FetchOutcome, PanelBoard, PanelKind};
use crate::gateway::FetchGateway;

/// Handles for the fetches spawned by one [`PanelDriver::apply`].
#[derive(Debug)]
pub struct DispatchedRun {
    /// `None` when the snapshot had no active panels
    pub generation: Option<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl DispatchedRun {
    pub fn fetch_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every fetch of this run to finish (applied, failed, discarded
    /// or aborted by a newer run)
    pub async fn finished(self) {
        for task in self.tasks {
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!("[PANELS] Fetch task ended abnormally: {}", e),
            }
        }
    }
}

pub struct PanelDriver<G> {
    orchestrator: Rc<RefCell<PanelOrchestrator>>,
    gateway: Rc<G>,
    limiter: Option<Arc<Semaphore>>,
    board_tx: Rc<watch::Sender<PanelBoard>>,
    /// Fetch tasks of the latest run
    running: RefCell<Vec<AbortHandle>>,
}

impl<G: FetchGateway + 'static> PanelDriver<G> {
    /// `max_in_flight` caps concurrent fetches across all runs; 0 disables the cap.
    pub fn new(gateway: G, max_in_flight: usize) -> Self {
        let (board_tx, _) = watch::channel(PanelBoard::default());
        Self {
            orchestrator: Rc::new(RefCell::new(PanelOrchestrator::new())),
            gateway: Rc::new(gateway),
            limiter: (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight))),
            board_tx: Rc::new(board_tx),
            running: RefCell::new(Vec::new()),
        }
    }

    /// Receiver that sees a fresh board after every run start and applied result
    pub fn subscribe(&self) -> watch::Receiver<PanelBoard> {
        self.board_tx.subscribe()
    }

    pub fn board(&self) -> PanelBoard {
        self.orchestrator.borrow().board().clone()
    }

    pub fn generation(&self) -> u64 {
        self.orchestrator.borrow().generation()
    }

    /// Start a run for `snapshot`.
    ///
    /// The new board is published before this returns, so observers never see
    /// a result from this run ahead of its loading state. Fetches still in
    /// flight from the previous run are aborted.
    pub fn apply(&self, snapshot: Arc<QuerySnapshot>) -> DispatchedRun {
        let superseded: Vec<AbortHandle> = self.running.borrow_mut().drain(..).collect();
        if !superseded.is_empty() {
            tracing::debug!("[PANELS] Aborting {} superseded fetches", superseded.len());
        }
        for handle in superseded {
            handle.abort();
        }

        let tickets = self.orchestrator.borrow_mut().on_snapshot_change(&snapshot);
        self.publish();

        let generation = tickets.first().map(|t| t.generation);
        let tasks: Vec<JoinHandle<()>> = tickets
            .into_iter()
            .map(|ticket| tokio::task::spawn_local(self.fetch(Arc::clone(&snapshot), ticket)))
            .collect();
        *self.running.borrow_mut() = tasks.iter().map(JoinHandle::abort_handle).collect();
        DispatchedRun { generation, tasks }
    }

    /// Wait until no panel of the current board is loading and return it
    pub async fn settled(&self) -> PanelBoard {
        let mut rx = self.subscribe();
        match rx.wait_for(|board| !board.is_loading()).await {
            Ok(board) => board.clone(),
            Err(_) => self.board(),
        }
    }

    fn publish(&self) {
        let board = self.orchestrator.borrow().board().clone();
        self.board_tx.send_replace(board);
    }

    fn fetch(
        &self,
        snapshot: Arc<QuerySnapshot>,
        ticket: FetchTicket,
    ) -> impl Future<Output = ()> + use<G> {
        let orchestrator = Rc::clone(&self.orchestrator);
        let gateway = Rc::clone(&self.gateway);
        let limiter = self.limiter.clone();
        let board_tx = Rc::clone(&self.board_tx);

        async move {
            let _permit = match limiter {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            // A newer run may have started while this fetch waited for a permit
            if !orchestrator.borrow().is_current(&ticket) {
                tracing::debug!(
                    "[PANELS] Skipping {} fetch for '{}': run {} superseded",
                    ticket.kind,
                    ticket.field,
                    ticket.generation
                );
                return;
            }

            let outcome = match ticket.kind {
                PanelKind::Table => FetchOutcome::Table(
                    gateway
                        .fetch_table(&snapshot, &ticket.field)
                        .await
                        .map_err(|e| e.to_string()),
                ),
                PanelKind::Chart => FetchOutcome::Chart(
                    gateway
                        .fetch_chart(&snapshot, &ticket.field)
                        .await
                        .map_err(|e| e.to_string()),
                ),
            };

            let reconciled = orchestrator.borrow_mut().reconcile(&ticket, outcome);
            if reconciled == Reconciled::Applied {
                let board = orchestrator.borrow().board().clone();
                board_tx.send_replace(board);
            }
        }
    }
}
