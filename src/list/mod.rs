//! Entity lists
//!
//! One generic list type serves every style. Construction operations are
//! spread over submodules by concern: adding to CORE lists, edit sessions,
//! copies and diffs.

mod copy;
mod diff;
pub mod entity_list;
pub mod load;
mod session;
pub mod style;

pub use entity_list::{EntityList, SealedRecord};
pub use load::{LoadPolicy, LoadReport, NewEntity, RejectedItem};
pub use style::ListStyle;
