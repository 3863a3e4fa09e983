//! Session construction, the shared call path, and janitor lifecycle.

use crate::cache::{CacheStats, EntryCache, JANITOR_INTERVAL, SWEEP_INSPECT_LIMIT};
use crate::error::ClientError;
use crate::transport::RpcTransport;
use nfs3_proto::rpc::{Auth, CallHeader};
use nfs3_proto::wire::{FileHandle, FsInfo, FsInfoArgs};
use nfs3_proto::xdr::{XdrDecode, XdrDecoder, XdrEncode, XdrEncoder};
use nfs3_proto::{proc, Nfs3Status};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// One mounted remote volume.
///
/// Holds the root handle, credentials, negotiated filesystem info, and the
/// directory-entry cache. Operations may be invoked concurrently from
/// multiple tasks; each operation's own remote calls are sequential.
pub struct Session {
    transport: Arc<dyn RpcTransport>,
    auth: Auth,
    root: FileHandle,
    fsinfo: FsInfo,
    pub(crate) entry_ttl: Duration,
    pub(crate) cache: Arc<EntryCache>,
    janitor: Mutex<Option<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl Session {
    /// Establish a session on an already-mounted volume.
    ///
    /// `root` is the volume's root file handle (obtained out of band via
    /// the mount protocol). Negotiates filesystem info up front and starts
    /// the cache janitor. Directory entries resolved through this session
    /// are cached for `entry_ttl`.
    pub async fn connect(
        transport: Arc<dyn RpcTransport>,
        auth: Auth,
        root: FileHandle,
        entry_ttl: Duration,
    ) -> Result<Self, ClientError> {
        let mut reply = raw_call(transport.as_ref(), &auth, proc::FSINFO, |enc| {
            FsInfoArgs { root: root.clone() }.encode(enc);
        })
        .await?;
        let fsinfo = FsInfo::decode(&mut reply)?;
        debug!(root = ?root, dtpref = fsinfo.dtpref, "negotiated fsinfo");

        let cache = Arc::new(EntryCache::new());
        let (shutdown, janitor) = spawn_janitor(Arc::clone(&cache));

        Ok(Self {
            transport,
            auth,
            root,
            fsinfo,
            entry_ttl,
            cache,
            janitor: Mutex::new(Some(janitor)),
            shutdown,
        })
    }

    /// The volume's root file handle.
    pub fn root(&self) -> &FileHandle {
        &self.root
    }

    /// Filesystem capabilities negotiated at connect time.
    pub fn fsinfo(&self) -> &FsInfo {
        &self.fsinfo
    }

    /// Current entry-cache occupancy, for monitoring and tests.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Stop the cache janitor and wait for it to exit. The session remains
    /// usable afterwards; expired entries are then only dropped lazily.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.janitor.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Issue one procedure call: encode header and body, exchange it over
    /// the transport, read the leading status word, and hand back a cursor
    /// positioned at the result body.
    pub(crate) async fn call<F>(&self, procedure: u32, encode_body: F) -> Result<XdrDecoder, ClientError>
    where
        F: FnOnce(&mut XdrEncoder),
    {
        raw_call(self.transport.as_ref(), &self.auth, procedure, encode_body).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Last-resort cleanup for sessions dropped without shutdown().
        if let Some(handle) = self.janitor.lock().take() {
            handle.abort();
        }
    }
}

async fn raw_call<F>(
    transport: &dyn RpcTransport,
    auth: &Auth,
    procedure: u32,
    encode_body: F,
) -> Result<XdrDecoder, ClientError>
where
    F: FnOnce(&mut XdrEncoder),
{
    let mut enc = XdrEncoder::new();
    CallHeader::nfs3(procedure, auth.clone()).encode(&mut enc);
    encode_body(&mut enc);

    let reply = transport.call(&enc.into_bytes()).await?;
    let mut dec = XdrDecoder::new(reply);
    let status = dec.get_u32()?;
    Nfs3Status::from_code(status)?;
    Ok(dec)
}

fn spawn_janitor(cache: Arc<EntryCache>) -> (watch::Sender<bool>, JoinHandle<()>) {
    let (tx, mut rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(JANITOR_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = cache.sweep(Instant::now(), SWEEP_INSPECT_LIMIT);
                    if evicted > 0 {
                        trace!(evicted, "janitor swept expired entries");
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
            }
        }
    });
    (tx, handle)
}
