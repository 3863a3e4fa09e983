//! In-memory NFSv3 server used as the transport in integration tests.
//!
//! Implements [`RpcTransport`] by decoding each call message, executing it
//! against an in-memory tree, and encoding a real NFSv3 reply. Records
//! every procedure it serves so tests can assert on round-trip counts.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use nfs3_client::{RpcTransport, TransportError};
use nfs3_proto::rpc::CallHeader;
use nfs3_proto::status::{
    NFS3ERR_ACCES, NFS3ERR_BAD_COOKIE, NFS3ERR_EXIST, NFS3ERR_ISDIR, NFS3ERR_NOENT,
    NFS3ERR_NOTDIR, NFS3ERR_NOTEMPTY, NFS3_OK,
};
use nfs3_proto::wire::{
    CreateArgs, DirOpArgs3, EntryPlus3, Fattr3, FileHandle, FileType, FsInfo, FsInfoArgs,
    LookupArgs, LookupOk, MkdirArgs, NewObjectOk, Nfs3Time, ReadDirPlusArgs, ReadDirPlusPage,
    WccData,
};
use nfs3_proto::xdr::{XdrDecode, XdrDecoder, XdrEncode, XdrEncoder};
use nfs3_proto::proc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub const ROOT_ID: u64 = 1;

/// Opt-in tracing for debugging test failures (`RUST_LOG=trace`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Cookie verifier this server hands out and expects echoed back.
const COOKIE_VERF: u64 = 0x5EED;

struct Node {
    kind: FileType,
    mode: u32,
    parent: u64,
    /// Present for directories only.
    children: Option<BTreeMap<String, u64>>,
}

struct State {
    nodes: HashMap<u64, Node>,
    next_id: u64,
    /// Procedure number of every call served, in order.
    calls: Vec<u32>,
    /// Max entries returned per READDIRPLUS page.
    page_entries: usize,
    /// `(parent id, name)` pairs whose REMOVE fails with ACCES.
    protected: HashSet<(u64, String)>,
    /// When set, READDIRPLUS replies with a truncated body.
    corrupt_readdir: bool,
}

pub struct FakeNfsServer {
    state: Mutex<State>,
}

impl FakeNfsServer {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            Node {
                kind: FileType::Directory,
                mode: 0o755,
                parent: ROOT_ID,
                children: Some(BTreeMap::new()),
            },
        );
        Self {
            state: Mutex::new(State {
                nodes,
                next_id: ROOT_ID + 1,
                calls: Vec::new(),
                page_entries: usize::MAX,
                protected: HashSet::new(),
                corrupt_readdir: false,
            }),
        }
    }

    pub fn root_handle() -> FileHandle {
        encode_handle(ROOT_ID)
    }

    // ------------------------------------------------------------------
    // Test setup and assertion helpers
    // ------------------------------------------------------------------

    pub fn add_dir(&self, path: &str) {
        self.add_node(path, FileType::Directory);
    }

    pub fn add_file(&self, path: &str) {
        self.add_node(path, FileType::Regular);
    }

    fn add_node(&self, path: &str, kind: FileType) {
        let mut state = self.state.lock().unwrap();
        let mut current = ROOT_ID;
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let (leaf, parents) = components.split_last().expect("non-empty path");
        for component in parents {
            let existing = state.nodes[&current]
                .children
                .as_ref()
                .expect("parent is a directory")
                .get(*component)
                .copied();
            current = match existing {
                Some(id) => id,
                None => insert_node(&mut state, current, component, FileType::Directory),
            };
        }
        insert_node(&mut state, current, leaf, kind);
    }

    pub fn exists(&self, path: &str) -> bool {
        let state = self.state.lock().unwrap();
        let mut current = ROOT_ID;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let Some(children) = state.nodes[&current].children.as_ref() else {
                return false;
            };
            match children.get(component) {
                Some(id) => current = *id,
                None => return false,
            }
        }
        true
    }

    /// Number of calls served for one procedure.
    pub fn calls(&self, procedure: u32) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|p| **p == procedure).count()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn set_page_entries(&self, n: usize) {
        self.state.lock().unwrap().page_entries = n;
    }

    pub fn set_corrupt_readdir(&self, corrupt: bool) {
        self.state.lock().unwrap().corrupt_readdir = corrupt;
    }

    /// Make REMOVE of `path` fail with ACCES.
    pub fn protect(&self, path: &str) {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let (leaf, parents) = components.split_last().expect("non-empty path");
        let mut state = self.state.lock().unwrap();
        let mut current = ROOT_ID;
        for component in parents {
            current = state.nodes[&current].children.as_ref().unwrap()[*component];
        }
        state.protected.insert((current, (*leaf).to_string()));
    }

    // ------------------------------------------------------------------
    // Procedure handlers
    // ------------------------------------------------------------------

    fn handle_fsinfo(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = FsInfoArgs::decode(dec).expect("fsinfo args");
        let state = self.state.lock().unwrap();
        let Some(id) = decode_handle(&args.root) else {
            return err_reply(NFS3ERR_NOENT);
        };
        let Some(node) = state.nodes.get(&id) else {
            return err_reply(NFS3ERR_NOENT);
        };
        let info = FsInfo {
            attr: Some(fattr(id, node)),
            rtmax: 65536,
            rtpref: 32768,
            rtmult: 4096,
            wtmax: 65536,
            wtpref: 32768,
            wtmult: 4096,
            dtpref: 4096,
            max_file_size: u64::MAX,
            time_delta: Nfs3Time {
                seconds: 0,
                nseconds: 1,
            },
            properties: 0,
        };
        ok_reply(|enc| info.encode(enc))
    }

    fn handle_lookup(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = LookupArgs::decode(dec).expect("lookup args");
        let state = self.state.lock().unwrap();
        let Some((dir_id, dir)) = resolve_dir(&state, &args.what.dir) else {
            return err_reply(NFS3ERR_NOTDIR);
        };
        let target = match args.what.name.as_str() {
            "." => Some(dir_id),
            ".." => Some(dir.parent),
            name => dir.children.as_ref().unwrap().get(name).copied(),
        };
        let Some(id) = target else {
            return err_reply(NFS3ERR_NOENT);
        };
        let ok = LookupOk {
            handle: encode_handle(id),
            attr: Some(fattr(id, &state.nodes[&id])),
            dir_attr: Some(fattr(dir_id, dir)),
        };
        ok_reply(|enc| ok.encode(enc))
    }

    fn handle_readdirplus(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = ReadDirPlusArgs::decode(dec).expect("readdirplus args");
        let state = self.state.lock().unwrap();

        if state.corrupt_readdir {
            // Status says success, body ends mid-structure.
            let mut enc = XdrEncoder::new();
            enc.put_u32(NFS3_OK);
            enc.put_bool(true);
            return enc.into_bytes();
        }

        let Some((dir_id, dir)) = resolve_dir(&state, &args.dir) else {
            return err_reply(NFS3ERR_NOTDIR);
        };
        if args.cookie != 0 && args.cookie_verifier != COOKIE_VERF {
            return err_reply(NFS3ERR_BAD_COOKIE);
        }

        let mut listing: Vec<(String, u64)> =
            vec![(".".to_string(), dir_id), ("..".to_string(), dir.parent)];
        for (name, id) in dir.children.as_ref().unwrap() {
            listing.push((name.clone(), *id));
        }

        let start = args.cookie as usize;
        let end = (start + state.page_entries).min(listing.len());
        let eof = end == listing.len();

        let page = ReadDirPlusPage {
            dir_attr: Some(fattr(dir_id, dir)),
            cookie_verifier: COOKIE_VERF,
        };
        ok_reply(|enc| {
            page.encode(enc);
            for (index, (name, id)) in listing[start..end].iter().enumerate() {
                let entry = EntryPlus3 {
                    fileid: *id,
                    name: name.clone(),
                    cookie: (start + index + 1) as u64,
                    attr: Some(fattr(*id, &state.nodes[id])),
                    handle: Some(encode_handle(*id)),
                };
                enc.put_bool(true);
                entry.encode(enc);
            }
            enc.put_bool(false);
            enc.put_bool(eof);
        })
    }

    fn handle_mkdir(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = MkdirArgs::decode(dec).expect("mkdir args");
        self.create_node(&args.where_, FileType::Directory, args.attrs.mode)
    }

    fn handle_create(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = CreateArgs::decode(dec).expect("create args");
        let mode = match args.how {
            nfs3_proto::wire::CreateHow::Unchecked(attrs)
            | nfs3_proto::wire::CreateHow::Guarded(attrs) => attrs.mode,
        };
        self.create_node(&args.where_, FileType::Regular, mode)
    }

    fn create_node(&self, where_: &DirOpArgs3, kind: FileType, mode: Option<u32>) -> Vec<u8> {
        let mut state = self.state.lock().unwrap();
        let Some((dir_id, dir)) = resolve_dir(&state, &where_.dir) else {
            return err_reply(NFS3ERR_NOTDIR);
        };
        if dir.children.as_ref().unwrap().contains_key(&where_.name) {
            return err_reply(NFS3ERR_EXIST);
        }
        let id = insert_node_with_mode(&mut state, dir_id, &where_.name, kind, mode.unwrap_or(0o644));
        let ok = NewObjectOk {
            handle: Some(encode_handle(id)),
            attr: Some(fattr(id, &state.nodes[&id])),
            dir_wcc: WccData::default(),
        };
        ok_reply(|enc| ok.encode(enc))
    }

    fn handle_remove(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = DirOpArgs3::decode(dec).expect("remove args");
        let mut state = self.state.lock().unwrap();
        let Some((dir_id, dir)) = resolve_dir(&state, &args.dir) else {
            return err_reply(NFS3ERR_NOTDIR);
        };
        let Some(&target) = dir.children.as_ref().unwrap().get(&args.name) else {
            return err_reply(NFS3ERR_NOENT);
        };
        if state.protected.contains(&(dir_id, args.name.clone())) {
            return err_reply(NFS3ERR_ACCES);
        }
        if state.nodes[&target].kind == FileType::Directory {
            return err_reply(NFS3ERR_ISDIR);
        }
        remove_node(&mut state, dir_id, &args.name, target);
        ok_reply(|enc| WccData::default().encode(enc))
    }

    fn handle_rmdir(&self, dec: &mut XdrDecoder) -> Vec<u8> {
        let args = DirOpArgs3::decode(dec).expect("rmdir args");
        let mut state = self.state.lock().unwrap();
        let Some((dir_id, dir)) = resolve_dir(&state, &args.dir) else {
            return err_reply(NFS3ERR_NOTDIR);
        };
        let Some(&target) = dir.children.as_ref().unwrap().get(&args.name) else {
            return err_reply(NFS3ERR_NOENT);
        };
        let target_node = &state.nodes[&target];
        if target_node.kind != FileType::Directory {
            return err_reply(NFS3ERR_NOTDIR);
        }
        if !target_node.children.as_ref().unwrap().is_empty() {
            return err_reply(NFS3ERR_NOTEMPTY);
        }
        remove_node(&mut state, dir_id, &args.name, target);
        ok_reply(|enc| WccData::default().encode(enc))
    }
}

impl Default for FakeNfsServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcTransport for FakeNfsServer {
    async fn call(&self, message: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut dec = XdrDecoder::new(message.to_vec());
        let header = CallHeader::decode(&mut dec)
            .map_err(|e| TransportError::Other(format!("bad call header: {e}")))?;
        self.state.lock().unwrap().calls.push(header.procedure);

        let reply = match header.procedure {
            proc::FSINFO => self.handle_fsinfo(&mut dec),
            proc::LOOKUP => self.handle_lookup(&mut dec),
            proc::READDIRPLUS => self.handle_readdirplus(&mut dec),
            proc::MKDIR => self.handle_mkdir(&mut dec),
            proc::CREATE => self.handle_create(&mut dec),
            proc::REMOVE => self.handle_remove(&mut dec),
            proc::RMDIR => self.handle_rmdir(&mut dec),
            other => {
                return Err(TransportError::Other(format!(
                    "unsupported procedure {other}"
                )))
            }
        };
        Ok(reply)
    }
}

// ----------------------------------------------------------------------
// Free helpers
// ----------------------------------------------------------------------

fn encode_handle(id: u64) -> FileHandle {
    FileHandle::new(id.to_be_bytes().to_vec())
}

fn decode_handle(handle: &FileHandle) -> Option<u64> {
    let bytes: [u8; 8] = handle.as_bytes().try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

fn resolve_dir<'a>(state: &'a State, handle: &FileHandle) -> Option<(u64, &'a Node)> {
    let id = decode_handle(handle)?;
    let node = state.nodes.get(&id)?;
    if node.kind == FileType::Directory {
        Some((id, node))
    } else {
        None
    }
}

fn insert_node(state: &mut State, parent: u64, name: &str, kind: FileType) -> u64 {
    insert_node_with_mode(state, parent, name, kind, 0o755)
}

fn insert_node_with_mode(
    state: &mut State,
    parent: u64,
    name: &str,
    kind: FileType,
    mode: u32,
) -> u64 {
    let id = state.next_id;
    state.next_id += 1;
    state.nodes.insert(
        id,
        Node {
            kind,
            mode,
            parent,
            children: (kind == FileType::Directory).then(BTreeMap::new),
        },
    );
    state
        .nodes
        .get_mut(&parent)
        .expect("parent exists")
        .children
        .as_mut()
        .expect("parent is a directory")
        .insert(name.to_string(), id);
    id
}

fn remove_node(state: &mut State, parent: u64, name: &str, target: u64) {
    state
        .nodes
        .get_mut(&parent)
        .unwrap()
        .children
        .as_mut()
        .unwrap()
        .remove(name);
    state.nodes.remove(&target);
}

fn fattr(id: u64, node: &Node) -> Fattr3 {
    Fattr3 {
        ftype: node.kind,
        mode: node.mode,
        nlink: 1,
        uid: 0,
        gid: 0,
        size: 0,
        used: 0,
        rdev_major: 0,
        rdev_minor: 0,
        fsid: 1,
        fileid: id,
        atime: Nfs3Time::default(),
        mtime: Nfs3Time::default(),
        ctime: Nfs3Time::default(),
    }
}

fn ok_reply(body: impl FnOnce(&mut XdrEncoder)) -> Vec<u8> {
    let mut enc = XdrEncoder::new();
    enc.put_u32(NFS3_OK);
    body(&mut enc);
    enc.into_bytes()
}

fn err_reply(code: u32) -> Vec<u8> {
    let mut enc = XdrEncoder::new();
    enc.put_u32(code);
    enc.into_bytes()
}
