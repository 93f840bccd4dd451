use std::cell::{Cell, RefCell};
use std::rc::Rc;
use rustc_hash::FxHashMap;

#[derive(Default)]
struct Runs {
    next_id: u64,
    live: FxHashMap<u64, Rc<Cell<bool>>>,
}

/// Tracks running dialogues so an owner (a scene or level manager) can
/// interrupt all of them at once. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct DialogRegistry {
    runs: Rc<RefCell<Runs>>,
}

/// A run's membership in a [`DialogRegistry`]; dropping it leaves the registry.
pub struct RunTicket {
    id: u64,
    cancelled: Rc<Cell<bool>>,
    runs: Rc<RefCell<Runs>>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> RunTicket {
        let mut runs = self.runs.borrow_mut();
        runs.next_id += 1;
        let id = runs.next_id;
        let cancelled = Rc::new(Cell::new(false));
        runs.live.insert(id, cancelled.clone());
        RunTicket { id, cancelled, runs: self.runs.clone() }
    }

    /// Cancels every registered run. Returns how many were cancelled.
    pub fn stop_all(&self) -> usize {
        let mut runs = self.runs.borrow_mut();
        let count = runs.live.len();
        for (_, flag) in runs.live.drain() {
            flag.set(true);
        }
        if count > 0 {
            log::info!("Stopping {} dialog run(s)", count);
        }
        count
    }

    /// Number of registered runs that have not been cancelled.
    pub fn active(&self) -> usize {
        self.runs.borrow().live.len()
    }
}

impl RunTicket {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        self.runs.borrow_mut().live.remove(&self.id);
    }
}

impl std::fmt::Debug for RunTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunTicket")
            .field("id", &self.id)
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}

impl std::fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogRegistry").field("active", &self.active()).finish()
    }
}
