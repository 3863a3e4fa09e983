//! Paged directory listing via READDIRPLUS.

use crate::error::ClientError;
use crate::session::Session;
use nfs3_proto::proc;
use nfs3_proto::wire::{EntryPlus3, FileHandle, ReadDirPlusArgs, ReadDirPlusPage};
use nfs3_proto::xdr::{XdrDecode, XdrEncode};
use tracing::{debug, trace};

/// Per-entry directory-data budget per page, in bytes. Conservative fixed
/// limit matching RFC 1813's guidance for READDIRPLUS sizing.
const READDIR_DIRCOUNT: u32 = 512;

/// Total reply-size budget per page, in bytes.
const READDIR_MAXCOUNT: u32 = 4096;

impl Session {
    /// List a directory by path, returning every entry in server order.
    pub async fn read_dir_plus(&self, path: &str) -> Result<Vec<EntryPlus3>, ClientError> {
        let (_, handle) = self.lookup(path).await?;
        self.read_dir_plus_handle(&handle).await
    }

    /// List a directory by handle.
    ///
    /// Issues as many READDIRPLUS calls as the server needs, resuming each
    /// page from the last entry's cookie and echoing the server's cookie
    /// verifier. The concatenation of all pages, in request order, is the
    /// full listing. Any decode failure aborts the whole listing; partial
    /// results are discarded.
    pub async fn read_dir_plus_handle(
        &self,
        dir: &FileHandle,
    ) -> Result<Vec<EntryPlus3>, ClientError> {
        let mut cookie = 0u64;
        let mut cookie_verifier = 0u64;
        let mut entries: Vec<EntryPlus3> = Vec::new();

        loop {
            let result = self
                .call(proc::READDIRPLUS, |enc| {
                    ReadDirPlusArgs {
                        dir: dir.clone(),
                        cookie,
                        cookie_verifier,
                        dircount: READDIR_DIRCOUNT,
                        maxcount: READDIR_MAXCOUNT,
                    }
                    .encode(enc);
                })
                .await;
            let mut reply = match result {
                Ok(reply) => reply,
                Err(e) => {
                    debug!(dir = ?dir, error = %e, "readdirplus failed");
                    return Err(e);
                }
            };

            let page = ReadDirPlusPage::decode(&mut reply)?;

            // The entry run is a linked list flattened onto the wire: each
            // presence flag announces whether another entry follows (RFC
            // 4506 §4.19).
            while reply.get_bool()? {
                let entry = EntryPlus3::decode(&mut reply)?;
                cookie = entry.cookie;
                entries.push(entry);
            }
            let eof = reply.get_bool()?;

            trace!(
                page_entries = entries.len(),
                cookie,
                eof,
                "decoded readdirplus page"
            );
            cookie_verifier = page.cookie_verifier;
            if eof {
                return Ok(entries);
            }
        }
    }
}
