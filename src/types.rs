//! Core types for the state machinery.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Severity of a change to a component since some reference version.
///
/// Ordered `None < Partial < Complete`; combining two severities keeps the
/// larger one.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum UpdateType {
    /// Nothing observable changed.
    #[default]
    None,
    /// Some entities changed; the changeset describes which.
    Partial,
    /// Treat everything as changed (full rebuild).
    Complete,
}

impl UpdateType {
    /// Combine two severities (max).
    pub fn combine(self, other: UpdateType) -> UpdateType {
        self.max(other)
    }

    /// Combine a sequence of severities. Empty input is `None`.
    pub fn combine_all(types: impl IntoIterator<Item = UpdateType>) -> UpdateType {
        types.into_iter().fold(UpdateType::None, UpdateType::combine)
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateType::None => "none",
            UpdateType::Partial => "partial",
            UpdateType::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Per-component version, incremented once per completed update scope.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable 128-bit identifier for assets, views and graph elements.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Build from a 128-bit integer.
    pub fn from_u128(value: u128) -> Self {
        Guid(value.to_be_bytes())
    }

    /// Derive a stable identifier from a name (first 16 bytes of SHA-256).
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Guid(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Guid(arr))
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identifier of a graph element (node, port, edge, variable, ...).
pub type ElementId = Guid;

/// Identity a component instance is keyed by.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    /// State bound to a graph asset, shared by every view of it.
    Asset(Guid),
    /// State bound to a window, independent of the loaded asset.
    View(Guid),
    /// State bound to one asset as seen in one window.
    AssetView { asset: Guid, view: Guid },
}

impl IdentityKey {
    /// Whether this identity belongs to `asset`.
    pub fn mentions_asset(&self, asset: &Guid) -> bool {
        match self {
            IdentityKey::Asset(a) | IdentityKey::AssetView { asset: a, .. } => a == asset,
            IdentityKey::View(_) => false,
        }
    }

    /// Whether this identity belongs to `view`.
    pub fn mentions_view(&self, view: &Guid) -> bool {
        match self {
            IdentityKey::View(v) | IdentityKey::AssetView { view: v, .. } => v == view,
            IdentityKey::Asset(_) => false,
        }
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Asset(a) => write!(f, "asset:{}", &a.to_hex()[..8]),
            IdentityKey::View(v) => write!(f, "view:{}", &v.to_hex()[..8]),
            IdentityKey::AssetView { asset, view } => {
                write!(f, "asset:{}/view:{}", &asset.to_hex()[..8], &view.to_hex()[..8])
            }
        }
    }
}

/// Address of a component in the [`State`](crate::state::State): its kind
/// plus its identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentKey {
    pub kind: &'static str,
    pub identity: IdentityKey,
}

impl ComponentKey {
    pub fn new(kind: &'static str, identity: IdentityKey) -> Self {
        Self { kind, identity }
    }

    /// Full, unambiguous name used in undo records.
    pub fn record_name(&self) -> String {
        match self.identity {
            IdentityKey::Asset(a) => format!("{}@asset/{}", self.kind, a),
            IdentityKey::View(v) => format!("{}@view/{}", self.kind, v),
            IdentityKey::AssetView { asset, view } => {
                format!("{}@asset/{}/view/{}", self.kind, asset, view)
            }
        }
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.identity)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.identity)
    }
}

/// Unique id of one component instance. Never reused within a `State`, so a
/// component replaced after a reset is distinguishable from its predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

/// Last version of a component an observer has seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Bookmark {
    /// Instance the version refers to. `None` until the first observation.
    pub instance: Option<InstanceId>,
    pub version: Version,
}

impl Bookmark {
    pub fn at(instance: InstanceId, version: Version) -> Self {
        Self {
            instance: Some(instance),
            version,
        }
    }
}
