mod entry;
mod table;

pub use entry::Entry;
pub use table::{ParamTable, SlotState};
