//! Bounded pool of write connections for the pooled backend.

pub mod pragmas;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use vigil_core::config::PoolConfig;
use vigil_core::errors::VigilResult;

use crate::to_storage_err;
use pragmas::apply_write_pragmas;

/// A bounded pool of SQLite write connections.
///
/// `min_size` connections open eagerly; the remaining slots open on first
/// use, up to `max_size`. Checkout is closure-based: the slot's guard is
/// released on every exit path, including errors inside the closure, so a
/// connection can never leak. Callers beyond capacity block on the slot
/// mutexes until one frees.
pub struct WritePool {
    slots: Vec<Mutex<Option<Connection>>>,
    path: PathBuf,
    next: AtomicUsize,
}

impl WritePool {
    /// Open a pool against the given database file.
    pub fn open(path: &Path, cfg: &PoolConfig) -> VigilResult<Self> {
        let max = cfg.max_size.max(1);
        let min = cfg.min_size.clamp(1, max);
        let mut slots = Vec::with_capacity(max);
        for i in 0..max {
            let conn = if i < min {
                Some(open_connection(path)?)
            } else {
                None
            };
            slots.push(Mutex::new(conn));
        }
        Ok(Self {
            slots,
            path: path.to_path_buf(),
            next: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with a pooled connection (round-robin checkout).
    pub fn with_conn<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> VigilResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut guard = self.slots[idx]
            .lock()
            .map_err(|e| to_storage_err(format!("pool slot poisoned: {e}")))?;
        if guard.is_none() {
            *guard = Some(open_connection(&self.path)?);
            tracing::debug!(slot = idx, "write pool grew a connection");
        }
        f(guard.as_ref().expect("slot populated above"))
    }

    /// Upper bound on concurrent connections.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Connections currently open (best effort: busy slots count as open).
    pub fn open_connections(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| match slot.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            })
            .count()
    }
}

fn open_connection(path: &Path) -> VigilResult<Connection> {
    let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
    apply_write_pragmas(&conn)?;
    Ok(conn)
}
