use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::body::{Card, File, ItemBody, Note, Password};
use crate::error::{Error, Result};

/// Metadata key recognized by the UI for a human-written description.
pub const META_DESCRIPTION: &str = "description";
/// Metadata key recognized by the UI for free-form extra information.
pub const META_ADDITIONAL_INFORMATION: &str = "additional information";

/// Upper bound on a [`File`] body's `body_bytes`, enforced on construction.
pub const MAX_FILE_BYTES: usize = 40 * 1024 * 1024;

/// A vault item: one variant body plus arbitrary string metadata.
///
/// Unknown `meta` keys round-trip untouched; only [`META_DESCRIPTION`] and
/// [`META_ADDITIONAL_INFORMATION`] are given meaning by callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub body: ItemBody,
    pub meta: HashMap<String, String>,
}

impl Item {
    pub fn new(body: ItemBody, meta: HashMap<String, String>) -> Self {
        Item { body, meta }
    }

    /// Builds a `File` item, rejecting bodies over [`MAX_FILE_BYTES`].
    pub fn new_file(name: String, body_bytes: Vec<u8>, meta: HashMap<String, String>) -> Result<Self> {
        if body_bytes.len() > MAX_FILE_BYTES {
            return Err(Error::LargeFile(body_bytes.len()));
        }
        Ok(Item::new(ItemBody::File(File { name, body_bytes }), meta))
    }

    pub fn display_name(&self) -> &str {
        self.body.display_name()
    }
}

/// The record actually placed on the wire: four optional variant fields,
/// exactly one of which should be set, plus the metadata map. This mirrors
/// the remote store's schemaless `data` blob: any future body kind is just
/// another optional field here, with no change needed server-side.
#[derive(Serialize, Deserialize)]
struct Wire {
    #[serde(default)]
    card: Option<Card>,
    #[serde(default)]
    password: Option<Password>,
    #[serde(default)]
    note: Option<Note>,
    #[serde(default)]
    file: Option<File>,
    #[serde(default)]
    meta: HashMap<String, String>,
}

impl From<&Item> for Wire {
    fn from(item: &Item) -> Self {
        let mut wire = Wire {
            card: None,
            password: None,
            note: None,
            file: None,
            meta: item.meta.clone(),
        };
        match &item.body {
            ItemBody::Card(c) => wire.card = Some(c.clone()),
            ItemBody::Password(p) => wire.password = Some(p.clone()),
            ItemBody::Note(n) => wire.note = Some(n.clone()),
            ItemBody::File(f) => wire.file = Some(f.clone()),
        }
        wire
    }
}

impl TryFrom<Wire> for Item {
    type Error = Error;

    /// Precedence on decode when more than one variant field is set:
    /// card, then password, then note, then file.
    fn try_from(wire: Wire) -> Result<Self> {
        let body = if let Some(c) = wire.card {
            ItemBody::Card(c)
        } else if let Some(p) = wire.password {
            ItemBody::Password(p)
        } else if let Some(n) = wire.note {
            ItemBody::Note(n)
        } else if let Some(f) = wire.file {
            ItemBody::File(f)
        } else {
            return Err(Error::BadItem);
        };
        Ok(Item { body, meta: wire.meta })
    }
}

/// Encodes an item to the opaque byte sequence stored as the remote `data`
/// field. Total: never fails.
pub fn encode(item: &Item) -> Vec<u8> {
    bincode::serialize(&Wire::from(item)).expect("Wire contains no unsupported types")
}

/// Decodes bytes produced by [`encode`]. Fails only when the bytes are not a
/// well-formed `Wire` record, or when no variant field is set.
pub fn decode(bytes: &[u8]) -> Result<Item> {
    let wire: Wire = bincode::deserialize(bytes).map_err(|_| Error::BadItem)?;
    Item::try_from(wire)
}
