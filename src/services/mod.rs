//! Service layer of the watcher.
//!
//! - Page fetching (`Fetcher`)
//! - Structural selection (`StructuralQuery`)
//! - Transforms and filters (`TransformPipeline`, `Filter`)
//! - Per-target checks (`PageChecker`)

mod checker;
mod fetcher;
mod filter;
mod notify;
mod selector;
mod transform;

pub use checker::{Extraction, PageChecker};
pub use fetcher::{DEFAULT_DEADLINE, Fetcher};
pub use filter::Filter;
pub use notify::Notifier;
pub use selector::StructuralQuery;
pub use transform::{
    Form, TransformPipeline, flatten_text, strip_attrs, strip_numbers, strip_scripts,
};
