pub mod decode;
pub mod decoder;
pub mod error;
pub mod index;
pub mod manifest;
pub mod message;
pub mod template;

pub use decoder::{create_decoder, Decoder};
pub use error::{DecodeError, ManifestError};
pub use index::{build_index, Category, IndexedItem, ReplaceIndex, REPLACEABLE_CATEGORIES};
pub use manifest::{
    FieldKind, Manifest, ManifestDocument, ManifestEntry, ScalarKind, DEFAULT_MANIFEST_VERSION,
};
pub use message::{Message, INDEX_FIELD};
pub use template::{count_placeholders, resolve_template, TemplateTable, Templates};
