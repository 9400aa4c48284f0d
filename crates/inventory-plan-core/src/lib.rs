pub mod error;
pub mod model;
pub mod types;

pub mod assembly;
pub mod planning;
pub mod recalc;
pub mod rollforward;
pub mod solver;

pub use error::InventoryError;
pub use model::{AccountKey, Category, ComputedRow, PeriodRaw, PeriodTables, RawRow, RowKey, Table};
pub use types::*;

/// Standard result type for all inventory-plan operations
pub type InventoryResult<T> = Result<T, InventoryError>;
