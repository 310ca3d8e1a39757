mod document;

pub use document::{
    parse_json_document, read_json_document, read_optional_json_document, ContentError,
};
