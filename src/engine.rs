// Simulation engine: replays requests and keeps a navigable history

use crate::allocator::{Allocator, MemSimResult};
use crate::errors::SimError;
use crate::request::Request;
use crate::snapshot::{Snapshot, SnapshotManager};

/// Replay `requests` on a fresh allocator and return the end-of-run stats
pub fn mem_sim(page_size: u64, requests: &[Request]) -> Result<MemSimResult, SimError> {
    let mut allocator = Allocator::new(page_size)?;
    for request in requests {
        request.apply(&mut allocator)?;
    }
    Ok(allocator.stats())
}

/// A request sequence replayed against an allocator, with one snapshot per
/// request for stepping backward and forward through the run
pub struct Simulation {
    /// Requests in input order
    requests: Vec<Request>,

    /// Allocator state at the current history position
    allocator: Allocator,

    /// Snapshot history: index 0 is the empty heap, index i+1 follows request i
    snapshot_manager: SnapshotManager,

    /// Current position in the snapshot history
    history_position: usize,

    /// Whether every request has been replayed
    finished: bool,
}

impl Simulation {
    /// Create a simulation; nothing is replayed until [`run`](Self::run)
    pub fn new(
        page_size: u64,
        requests: Vec<Request>,
        snapshot_memory_limit: usize,
    ) -> Result<Self, SimError> {
        Ok(Simulation {
            requests,
            allocator: Allocator::new(page_size)?,
            snapshot_manager: SnapshotManager::new(snapshot_memory_limit),
            history_position: 0,
            finished: false,
        })
    }

    /// Replay every request, capturing a snapshot after each one
    pub fn run(&mut self) -> Result<(), SimError> {
        self.run_with(|_, _, _| {})
    }

    /// Replay every request, calling `observer` with the request index, the
    /// request and the allocator state after it
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<(), SimError>
    where
        F: FnMut(usize, &Request, &Allocator),
    {
        if self.finished {
            return Err(SimError::History {
                message: "Simulation has already run".to_string(),
            });
        }

        self.take_snapshot(None)?;

        for index in 0..self.requests.len() {
            let request = self.requests[index];
            request.apply(&mut self.allocator)?;

            #[cfg(debug_assertions)]
            self.allocator
                .check_invariants()
                .map_err(|violation| SimError::Invariant {
                    request: index,
                    violation,
                })?;

            observer(index, &request, &self.allocator);
            self.take_snapshot(Some(index))?;
        }

        self.finished = true;
        Ok(())
    }

    /// Take a snapshot of the current allocator state and move onto it
    fn take_snapshot(&mut self, request_index: Option<usize>) -> Result<(), SimError> {
        self.snapshot_manager
            .push(Snapshot::new(self.allocator.clone(), request_index))?;
        self.history_position = self.snapshot_manager.len() - 1;
        Ok(())
    }

    /// Restore state from the snapshot at `position`
    fn restore(&mut self, position: usize) -> Result<(), SimError> {
        match self.snapshot_manager.get(position) {
            Some(snapshot) => {
                self.allocator = snapshot.allocator.clone();
                self.history_position = position;
                Ok(())
            }
            None => Err(SimError::History {
                message: format!("Snapshot {} not found in history", position),
            }),
        }
    }

    /// Step backward in history (undo the last request)
    pub fn step_backward(&mut self) -> Result<(), SimError> {
        if self.history_position == 0 {
            return Err(SimError::History {
                message: "Already at the beginning of the simulation".to_string(),
            });
        }
        self.restore(self.history_position - 1)
    }

    /// Step forward in history (redo the next request)
    pub fn step_forward(&mut self) -> Result<(), SimError> {
        if self.history_position + 1 >= self.snapshot_manager.len() {
            return Err(SimError::History {
                message: "No more snapshots available (simulation finished)".to_string(),
            });
        }
        self.restore(self.history_position + 1)
    }

    /// Rewind to the empty heap
    pub fn rewind_to_start(&mut self) -> Result<(), SimError> {
        if self.snapshot_manager.is_empty() {
            return Err(SimError::History {
                message: "No snapshots available".to_string(),
            });
        }
        self.restore(0)
    }

    /// Jump to the state after the last request
    pub fn jump_to_end(&mut self) -> Result<(), SimError> {
        match self.snapshot_manager.len() {
            0 => Err(SimError::History {
                message: "No snapshots available".to_string(),
            }),
            len => self.restore(len - 1),
        }
    }

    // ========== Getter methods for UI ==========

    /// Allocator state at the current history position
    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Index of the request that produced the current state
    pub fn current_request_index(&self) -> Option<usize> {
        self.snapshot_manager
            .get(self.history_position)
            .and_then(|snapshot| snapshot.request_index)
    }

    /// The request that produced the current state
    pub fn current_request(&self) -> Option<&Request> {
        self.current_request_index()
            .and_then(|index| self.requests.get(index))
    }

    pub fn history_position(&self) -> usize {
        self.history_position
    }

    pub fn total_snapshots(&self) -> usize {
        self.snapshot_manager.len()
    }

    pub fn snapshot_memory_usage(&self) -> usize {
        self.snapshot_manager.memory_usage()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stats after the last replayed request, regardless of history position
    pub fn final_stats(&self) -> MemSimResult {
        match self.snapshot_manager.last() {
            Some(snapshot) => snapshot.allocator.stats(),
            None => self.allocator.stats(),
        }
    }
}
