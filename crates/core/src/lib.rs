pub mod ids;
pub mod selection;
pub mod value;

pub use ids::{AttributeId, CaseId, DataSetId};
pub use selection::{CellRef, Selection, SelectionPolicy};
pub use value::Value;
