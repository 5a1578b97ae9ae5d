//! Variant vault items and their opaque wire encoding.
//!
//! An [`Item`] is one of {`Password`, `Card`, `Note`, `File`} plus a string
//! metadata map. [`codec::encode`]/[`codec::decode`] convert an `Item` to and
//! from the opaque byte blob the remote store treats as schemaless data.

pub mod body;
pub mod codec;
mod error;

pub use body::{Card, File, ItemBody, Note, Password};
pub use codec::{decode, encode, Item, MAX_FILE_BYTES, META_ADDITIONAL_INFORMATION, META_DESCRIPTION};
pub use error::{Error, Result};
