pub mod attribute;
pub mod case;
pub mod case_index;
pub mod config;
pub mod dataset;
pub mod derive;
pub mod events;
pub mod selection;
pub mod snapshot;
pub mod sort;
pub mod sync;
pub mod value_cache;

pub use attribute::{Attribute, AttributeSpec, ValueType};
pub use case::{CanonicalCase, Case, InsertAt};
pub use config::DataSetConfig;
pub use dataset::{Bounds, DataSet, SharedDataSet};
pub use derive::{CaseFilter, DerivationSpec};
pub use events::{ActionListener, Mutation, MutationCollector};
pub use snapshot::DataSetSnapshot;
pub use sort::{CaseMove, SortDirection};
pub use sync::{derive, Scheduler, Synchronized};

pub use caseset_core::{AttributeId, CaseId, CellRef, DataSetId, SelectionPolicy, Value};
