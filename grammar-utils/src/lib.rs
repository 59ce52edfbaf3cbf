pub mod grammeme;
pub mod inflection;
pub mod taxonomy;

pub use grammeme::{Category, Grammeme};
pub use inflection::{GrammemeSet, Inflection};
pub use taxonomy::{Taxonomy, TaxonomyBuilder, TaxonomyError};
