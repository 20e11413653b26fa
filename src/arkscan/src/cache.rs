//! Tribe id to name lookup, rebuilt from tribe files on expiry
//!
//! The mapping is never patched in place. When it is older than the TTL (or
//! empty) the next lookup rescans every configured directory and swaps in a
//! fresh snapshot. Two callers racing to rebuild both do the I/O; the later
//! swap wins and readers never see a half-built map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::files::list_files;
use crate::tribe::{read_tribe_file, EXTENSION};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub type TribeMap = HashMap<u32, String>;

/// Anything that can name a tribe.
pub trait TribeLookup {
    fn tribe_name(&self, tribe_id: u32) -> Option<String>;
}

impl TribeLookup for TribeMap {
    fn tribe_name(&self, tribe_id: u32) -> Option<String> {
        self.get(&tribe_id).cloned()
    }
}

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Snapshot {
    tribes: Arc<TribeMap>,
    built_at: Instant,
}

pub struct TribeCache<C: Clock = SystemClock> {
    dirs: Vec<PathBuf>,
    ttl: Duration,
    clock: C,
    state: RwLock<Option<Snapshot>>,
}

impl TribeCache<SystemClock> {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self::with_clock(dirs, DEFAULT_TTL, SystemClock)
    }
}

impl<C: Clock> TribeCache<C> {
    pub fn with_clock(dirs: Vec<PathBuf>, ttl: Duration, clock: C) -> Self {
        Self {
            dirs,
            ttl,
            clock,
            state: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Name for `tribe_id`, rebuilding first if the snapshot is stale.
    pub fn get_name(&self, tribe_id: u32) -> Option<String> {
        if tribe_id == 0 {
            return None;
        }
        self.get_or_rebuild().get(&tribe_id).cloned()
    }

    /// Current mapping, rebuilt if empty or older than the TTL.
    pub fn get_or_rebuild(&self) -> Arc<TribeMap> {
        let now = self.clock.now();
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(snapshot) = state.as_ref() {
                let age = now.saturating_duration_since(snapshot.built_at);
                if !snapshot.tribes.is_empty() && age < self.ttl {
                    return Arc::clone(&snapshot.tribes);
                }
            }
        }

        let tribes = Arc::new(self.scan());
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Some(Snapshot {
            tribes: Arc::clone(&tribes),
            built_at: now,
        });
        tribes
    }

    /// Drop the snapshot so the next lookup rescans.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = None;
    }

    fn scan(&self) -> TribeMap {
        let started = Instant::now();
        let mut tribes = TribeMap::new();
        for dir in &self.dirs {
            scan_dir(dir, &mut tribes);
        }
        info!(
            tribes = tribes.len(),
            dirs = self.dirs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rebuilt tribe cache"
        );
        tribes
    }
}

impl<C: Clock> TribeLookup for TribeCache<C> {
    fn tribe_name(&self, tribe_id: u32) -> Option<String> {
        self.get_name(tribe_id)
    }
}

fn scan_dir(dir: &Path, tribes: &mut TribeMap) {
    let files = match list_files(dir, Some(EXTENSION)) {
        Ok(files) => files,
        Err(e) => {
            warn!("Skipping tribe directory: {}", e);
            return;
        }
    };

    for path in files {
        match read_tribe_file(&path) {
            Ok(fields) => {
                if let Some(record) = fields.into_record() {
                    tribes.insert(record.tribe_id, record.tribe_name);
                } else {
                    debug!(path = %path.display(), "Tribe file without id or name");
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}
