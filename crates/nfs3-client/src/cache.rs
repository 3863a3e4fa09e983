//! Directory-entry cache with TTL expiration.
//!
//! Two-level map keyed by the parent directory's handle, then by child
//! name. Only directories are ever cached (the resolver enforces this);
//! an entry is honored only strictly before its expiration instant, so an
//! expired entry behaves as absent even before the janitor sweeps it.
//!
//! Every access takes one mutex and does nothing else under it — remote
//! calls never happen while the lock is held.

use nfs3_proto::wire::{Fattr3, FileHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

/// How often the janitor sweeps.
pub(crate) const JANITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Entries inspected per sweep, so one pass cannot hold the lock for an
/// unbounded time on a large cache. Leftover expired entries are picked up
/// on a later pass.
pub(crate) const SWEEP_INSPECT_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct CacheEntry {
    handle: FileHandle,
    attr: Fattr3,
    expires_at: Instant,
}

/// Counts reported by [`EntryCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Live plus not-yet-swept entries across all parent buckets.
    pub entries: usize,
    /// Parent-directory buckets currently present.
    pub buckets: usize,
}

/// Mutex-guarded `(parent handle, child name) -> (handle, attributes)`
/// cache with per-entry expiration.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: Mutex<HashMap<FileHandle, HashMap<String, CacheEntry>>>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a live entry, or `None` for a miss or an expired entry.
    pub fn lookup(&self, parent: &FileHandle, name: &str) -> Option<(FileHandle, Fattr3)> {
        let map = self.entries.lock();
        let entry = map.get(parent)?.get(name)?;
        if Instant::now() < entry.expires_at {
            Some((entry.handle.clone(), entry.attr.clone()))
        } else {
            None
        }
    }

    /// Store an entry expiring `ttl` from now. Callers only insert
    /// directories.
    pub fn insert(
        &self,
        parent: &FileHandle,
        name: &str,
        handle: FileHandle,
        attr: Fattr3,
        ttl: Duration,
    ) {
        let entry = CacheEntry {
            handle,
            attr,
            expires_at: Instant::now() + ttl,
        };
        let mut map = self.entries.lock();
        map.entry(parent.clone())
            .or_default()
            .insert(name.to_string(), entry);
    }

    /// Drop a specific entry immediately. Used after any mutation that
    /// could make it stale.
    pub fn invalidate(&self, parent: &FileHandle, name: &str) {
        let mut map = self.entries.lock();
        if let Some(bucket) = map.get_mut(parent) {
            bucket.remove(name);
            if bucket.is_empty() {
                map.remove(parent);
            }
        }
    }

    /// Remove entries that expired at or before `now`, inspecting at most
    /// `limit` entries. Returns the number evicted. Buckets emptied by the
    /// sweep are removed.
    pub fn sweep(&self, now: Instant, limit: usize) -> usize {
        let mut map = self.entries.lock();
        let mut inspected = 0usize;
        let mut evicted = 0usize;
        let mut emptied: Vec<FileHandle> = Vec::new();

        for (parent, bucket) in map.iter_mut() {
            let mut dead: Vec<String> = Vec::new();
            let mut capped = false;
            for (name, entry) in bucket.iter() {
                inspected += 1;
                if entry.expires_at <= now {
                    dead.push(name.clone());
                }
                if inspected >= limit {
                    capped = true;
                    break;
                }
            }
            for name in &dead {
                bucket.remove(name);
                evicted += 1;
            }
            if bucket.is_empty() {
                emptied.push(parent.clone());
            }
            if capped {
                break;
            }
        }

        for parent in emptied {
            map.remove(&parent);
        }
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let map = self.entries.lock();
        CacheStats {
            entries: map.values().map(HashMap::len).sum(),
            buckets: map.len(),
        }
    }
}
