//! Path resolution: walking slash-separated paths to file handles.

use crate::error::ClientError;
use crate::session::Session;
use nfs3_proto::wire::{DirOpArgs3, Fattr3, FileHandle, LookupArgs, LookupOk};
use nfs3_proto::xdr::{XdrDecode, XdrEncode};
use nfs3_proto::proc;
use tracing::{debug, trace};

/// Lexically clean a path into its lookup components.
///
/// Empty and `.` components are dropped, `..` pops the previous component
/// (the root is its own parent, so leading `..` is a no-op). Leading
/// slashes carry no meaning beyond that: every path is anchored at the
/// volume root. A path that cleans to nothing resolves as a single `.`
/// lookup on the root handle.
fn path_components(path: &str) -> Vec<&str> {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    if components.is_empty() {
        components.push(".");
    }
    components
}

impl Session {
    /// Resolve a path to the attributes and handle of its final component.
    ///
    /// Walks one component at a time from the root handle, consulting the
    /// entry cache before issuing a LOOKUP, and fails at the first
    /// component that cannot be resolved. Symbolic links are not
    /// dereferenced; they resolve as opaque leaf objects.
    pub async fn lookup(&self, path: &str) -> Result<(Fattr3, FileHandle), ClientError> {
        let mut components = path_components(path).into_iter();
        // path_components never returns an empty walk.
        let first = components.next().unwrap_or(".");
        let (mut attr, mut handle) = self.cached_lookup(self.root(), first).await?;
        for component in components {
            let (component_attr, next) = self.cached_lookup(&handle, component).await?;
            attr = component_attr;
            handle = next;
        }
        Ok((attr, handle))
    }

    /// Look up one name under a directory handle, going through the entry
    /// cache. Freshly resolved directories are cached for the session's
    /// entry TTL; anything else is never cached.
    pub(crate) async fn cached_lookup(
        &self,
        dir: &FileHandle,
        name: &str,
    ) -> Result<(Fattr3, FileHandle), ClientError> {
        if let Some((handle, attr)) = self.cache.lookup(dir, name) {
            trace!(name, "entry cache hit");
            return Ok((attr, handle));
        }

        let (attr, handle) = self.lookup_entry(dir, name).await?;
        if attr.is_directory() {
            self.cache
                .insert(dir, name, handle.clone(), attr.clone(), self.entry_ttl);
        }
        Ok((attr, handle))
    }

    /// Issue a LOOKUP for one name under a directory handle, bypassing the
    /// cache.
    pub(crate) async fn lookup_entry(
        &self,
        dir: &FileHandle,
        name: &str,
    ) -> Result<(Fattr3, FileHandle), ClientError> {
        let result = self
            .call(proc::LOOKUP, |enc| {
                LookupArgs {
                    what: DirOpArgs3 {
                        dir: dir.clone(),
                        name: name.to_string(),
                    },
                }
                .encode(enc);
            })
            .await;
        let mut reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!(name, error = %e, "lookup failed");
                return Err(e);
            }
        };

        let ok = LookupOk::decode(&mut reply)?;
        let attr = ok
            .attr
            .ok_or(ClientError::MissingReplyField("lookup attributes"))?;
        trace!(name, handle = ?ok.handle, "lookup resolved");
        Ok((attr, ok.handle))
    }
}
