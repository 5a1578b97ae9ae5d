use serde::{Deserialize, Serialize};

/// A saved website credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Password {
    pub resource: String,
    pub user_name: String,
    pub password: String,
}

/// A payment card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    pub expires: String,
    pub holder: String,
}

/// A free-form text note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    pub body: String,
}

/// An arbitrary file, stored inline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub body_bytes: Vec<u8>,
}

/// The variant body of an [`crate::Item`]. Exactly one kind per item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemBody {
    Password(Password),
    Card(Card),
    Note(Note),
    File(File),
}

impl ItemBody {
    /// The user-facing display name for this body, per kind.
    pub fn display_name(&self) -> &str {
        match self {
            ItemBody::Password(p) => &p.resource,
            ItemBody::Card(c) => &c.number,
            ItemBody::Note(n) => &n.name,
            ItemBody::File(f) => &f.name,
        }
    }
}
