//! Handle registries.
//!
//! Native objects never cross the boundary. Each kind (variable, constraint,
//! row) gets its own growable arena, and the host sees a positive `i32` that
//! indexes into it. The raw value also carries a tag of the lifetime epoch it
//! was issued in, so a handle from before a reset never resolves afterwards,
//! even when the arena position has been reused.

use std::fmt;

use tracing::debug;

use crate::engine::Engine;
use crate::error::{BridgeError, BridgeResult};

/// Sentinel returned by handle-producing operations on failure.
pub const INVALID_HANDLE: i32 = -1;

/// Initial backing capacity of a registry.
pub const INITIAL_CAPACITY: usize = 64;

const INDEX_BITS: u32 = 24;
const INDEX_MASK: i32 = (1 << INDEX_BITS) - 1;
const EPOCH_TAGS: u32 = 128;

/// Largest number of entries a single registry can hold per epoch.
pub const MAX_ENTRIES: usize = INDEX_MASK as usize;

/// Object kind a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Variable,
    Constraint,
    Row,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Variable => write!(f, "variable"),
            HandleKind::Constraint => write!(f, "constraint"),
            HandleKind::Row => write!(f, "row"),
        }
    }
}

/// Host-safe alias for a native object.
///
/// Layout of the raw value: bits 0..24 hold `index + 1`, bits 24..31 hold the
/// epoch tag. The value is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(i32);

impl Handle {
    fn encode(epoch: u32, index: usize) -> Self {
        let tag = (epoch % EPOCH_TAGS) as i32;
        Handle((tag << INDEX_BITS) | (index as i32 + 1))
    }

    /// Wrap a raw value received from the host. Zero and negative values are
    /// never handles.
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw > 0 && raw & INDEX_MASK != 0).then_some(Handle(raw))
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    fn index(self) -> usize {
        ((self.0 & INDEX_MASK) - 1) as usize
    }

    fn tag(self) -> u32 {
        (self.0 >> INDEX_BITS) as u32
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arena mapping native objects of one kind to handles.
#[derive(Debug)]
pub struct HandleRegistry<T> {
    kind: HandleKind,
    entries: Vec<T>,
    epoch: u32,
}

impl<T: Copy + PartialEq> HandleRegistry<T> {
    pub fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            epoch: 0,
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Return the handle for `object`, appending it if it has none yet.
    ///
    /// Identity is decided by a linear scan. Growth doubles the capacity
    /// starting at [`INITIAL_CAPACITY`]; if it fails the registry is left
    /// untouched.
    pub fn register(&mut self, object: T) -> BridgeResult<Handle> {
        if let Some(index) = self.entries.iter().position(|entry| *entry == object) {
            return Ok(Handle::encode(self.epoch, index));
        }

        let len = self.entries.len();
        if len >= MAX_ENTRIES {
            return Err(BridgeError::InvalidArgument(format!(
                "{} registry is full",
                self.kind
            )));
        }
        if len == self.entries.capacity() {
            let target = (self.entries.capacity() * 2).max(INITIAL_CAPACITY);
            self.entries.try_reserve_exact(target - len)?;
            debug!(kind = %self.kind, capacity = target, "registry grown");
        }

        self.entries.push(object);
        Ok(Handle::encode(self.epoch, len))
    }

    /// Look up the object behind a raw handle.
    pub fn resolve(&self, raw: i32) -> BridgeResult<T> {
        Handle::from_raw(raw)
            .filter(|handle| handle.tag() == self.epoch % EPOCH_TAGS)
            .and_then(|handle| self.entries.get(handle.index()).copied())
            .ok_or_else(|| BridgeError::invalid_handle(self.kind, raw))
    }

    /// Resolve every raw handle, failing on the first invalid one.
    pub fn resolve_all(&self, raws: &[i32]) -> BridgeResult<Vec<T>> {
        let mut out = Vec::new();
        out.try_reserve_exact(raws.len())?;
        for &raw in raws {
            out.push(self.resolve(raw)?);
        }
        Ok(out)
    }

    /// Drop every entry, release the backing storage and start a new epoch.
    pub fn clear(&mut self) {
        self.entries = Vec::new();
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// The three registries, always cleared together.
pub struct Registries<E: Engine> {
    pub vars: HandleRegistry<E::Var>,
    pub conss: HandleRegistry<E::Cons>,
    pub rows: HandleRegistry<E::Row>,
}

impl<E: Engine> Registries<E> {
    pub fn new() -> Self {
        Self {
            vars: HandleRegistry::new(HandleKind::Variable),
            conss: HandleRegistry::new(HandleKind::Constraint),
            rows: HandleRegistry::new(HandleKind::Row),
        }
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.conss.clear();
        self.rows.clear();
    }
}

impl<E: Engine> Default for Registries<E> {
    fn default() -> Self {
        Self::new()
    }
}
