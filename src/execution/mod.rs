//! Query execution module

mod engine;
mod record;
mod table;

pub use engine::*;
pub use record::TitleRecord;
pub use table::{SharedTable, TitleTable};
