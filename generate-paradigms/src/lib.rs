pub mod analysis;
pub mod compiler;
pub mod dictionary;
pub mod document;
pub mod error;
pub mod options;
pub mod output;
pub mod pattern;
pub mod records;

pub use compiler::Compiler;
pub use document::DocumentState;
pub use error::RecordError;
pub use options::CompileOptions;
