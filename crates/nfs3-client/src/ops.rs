//! Mutation operations and recursive tree deletion.
//!
//! Every mutation resolves the parent directory, issues exactly one remote
//! call for the leaf name, and on success invalidates any cached entry for
//! that name — it may now point at a new or removed object. Failures leave
//! the cache untouched.

use crate::error::ClientError;
use crate::session::Session;
use nfs3_proto::proc;
use nfs3_proto::wire::{
    CreateArgs, CreateHow, DirOpArgs3, FileHandle, MkdirArgs, NewObjectOk, Sattr3, WccData,
};
use nfs3_proto::xdr::{XdrDecode, XdrEncode};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Split a path into parent directory and leaf name. Trailing slashes are
/// ignored; a bare name has the volume root as its parent.
fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    }
}

impl Session {
    /// Create a directory with the given permission mode and return its
    /// handle.
    pub async fn mkdir(&self, path: &str, mode: u32) -> Result<FileHandle, ClientError> {
        let (parent, name) = split_parent(path);
        let (_, dir) = self.lookup(parent).await?;

        let mut reply = self
            .call(proc::MKDIR, |enc| {
                MkdirArgs {
                    where_: DirOpArgs3 {
                        dir: dir.clone(),
                        name: name.to_string(),
                    },
                    attrs: Sattr3::with_mode(mode),
                }
                .encode(enc);
            })
            .await
            .map_err(|e| {
                debug!(path, error = %e, "mkdir failed");
                e
            })?;

        let ok = NewObjectOk::decode(&mut reply)?;
        let handle = ok
            .handle
            .ok_or(ClientError::MissingReplyField("mkdir file handle"))?;
        self.cache.invalidate(&dir, name);
        debug!(path, handle = ?handle, "created directory");
        Ok(handle)
    }

    /// Create a regular file (UNCHECKED) with the given permission mode
    /// and return its handle.
    pub async fn create(&self, path: &str, mode: u32) -> Result<FileHandle, ClientError> {
        let (parent, name) = split_parent(path);
        let (_, dir) = self.lookup(parent).await?;

        let mut reply = self
            .call(proc::CREATE, |enc| {
                CreateArgs {
                    where_: DirOpArgs3 {
                        dir: dir.clone(),
                        name: name.to_string(),
                    },
                    how: CreateHow::Unchecked(Sattr3::with_mode(mode)),
                }
                .encode(enc);
            })
            .await
            .map_err(|e| {
                debug!(path, error = %e, "create failed");
                e
            })?;

        let ok = NewObjectOk::decode(&mut reply)?;
        let handle = ok
            .handle
            .ok_or(ClientError::MissingReplyField("create file handle"))?;
        self.cache.invalidate(&dir, name);
        debug!(path, "created file");
        Ok(handle)
    }

    /// Remove a file.
    pub async fn remove(&self, path: &str) -> Result<(), ClientError> {
        let (parent, name) = split_parent(path);
        let (_, dir) = self.lookup(parent).await?;
        self.remove_entry(&dir, name).await
    }

    /// Remove an empty directory.
    pub async fn rmdir(&self, path: &str) -> Result<(), ClientError> {
        let (parent, name) = split_parent(path);
        let (_, dir) = self.lookup(parent).await?;
        self.rmdir_entry(&dir, name).await
    }

    /// Remove a directory tree recursively.
    ///
    /// An absent target counts as success. A target that exists but is not
    /// a directory is an error — this operation never deletes files at the
    /// top level. Deletion is depth-first and strictly sequential; the
    /// first failing remote call aborts the whole operation, which may
    /// leave the tree partially deleted.
    pub async fn remove_all(&self, path: &str) -> Result<(), ClientError> {
        let (parent, name) = split_parent(path);
        let (_, parent_dir) = self.lookup(parent).await?;

        // Fast path: an empty (or already absent) directory.
        match self.rmdir_entry(&parent_dir, name).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_not_directory() => return Err(e),
            Err(_) => {}
        }

        let (_, target) = self.lookup_entry(&parent_dir, name).await?;
        self.remove_tree(&target).await?;

        // The subtree is empty now; remove the directory we started at.
        self.rmdir_entry(&parent_dir, name).await
    }

    /// Empty a directory depth-first, operating on handles so no path is
    /// re-resolved mid-walk.
    fn remove_tree<'a>(
        &'a self,
        dir: &'a FileHandle,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + 'a>> {
        Box::pin(async move {
            let entries = self.read_dir_plus_handle(dir).await?;
            for entry in entries {
                if entry.name == "." || entry.name == ".." {
                    continue;
                }
                if entry.is_directory() {
                    if let Some(child) = &entry.handle {
                        self.remove_tree(child).await?;
                    }
                    self.rmdir_entry(dir, &entry.name).await?;
                } else {
                    self.remove_entry(dir, &entry.name).await?;
                }
            }
            Ok(())
        })
    }

    /// Remove the named file from a parent directory handle.
    pub(crate) async fn remove_entry(
        &self,
        dir: &FileHandle,
        name: &str,
    ) -> Result<(), ClientError> {
        let mut reply = self
            .call(proc::REMOVE, |enc| {
                DirOpArgs3 {
                    dir: dir.clone(),
                    name: name.to_string(),
                }
                .encode(enc);
            })
            .await
            .map_err(|e| {
                debug!(name, error = %e, "remove failed");
                e
            })?;
        let _wcc = WccData::decode(&mut reply)?;
        self.cache.invalidate(dir, name);
        Ok(())
    }

    /// Remove the named directory from a parent directory handle.
    pub(crate) async fn rmdir_entry(
        &self,
        dir: &FileHandle,
        name: &str,
    ) -> Result<(), ClientError> {
        let mut reply = self
            .call(proc::RMDIR, |enc| {
                DirOpArgs3 {
                    dir: dir.clone(),
                    name: name.to_string(),
                }
                .encode(enc);
            })
            .await
            .map_err(|e| {
                debug!(name, error = %e, "rmdir failed");
                e
            })?;
        let _wcc = WccData::decode(&mut reply)?;
        self.cache.invalidate(dir, name);
        debug!(name, "removed directory");
        Ok(())
    }
}
