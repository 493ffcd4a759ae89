//! Obsel: rule-based row selection for single-dish observation metadata.
//!
//! Reducing a radio-telescope session starts with picking rows out of a large index
//! table: one row per integration, with scan number, feed, polarization, calibration
//! state, sky position and so on. Obsel keeps that picking reproducible by expressing it
//! as a ledger of named *rules*:
//! * A [`table::Table`] is the immutable metadata snapshot; rows are identified by index.
//! * A [`selection::Selection`] builds rules against it with exact ([`Selection::select`]),
//!   range ([`Selection::select_range`]) and tolerance ([`Selection::select_within`])
//!   predicates. Keys go through an [`alias::AliasTable`] and values through a
//!   [`sanitize::Sanitizer`], so `ra="12h30m"` and `crval2=187.5` mean the same thing.
//! * Each accepted [`rule::Rule`] gets a never-reused id, a tag (given or derived from its
//!   criteria) and its materialized row set. Two rules may never select the very same rows.
//! * [`Selection::finalize`] intersects every active rule into the final
//!   [`table::TableView`], which is what calibration consumes.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use obsel::{Criteria, Selection, Table};
//! let table = Table::builder()
//!     .ints("scan", vec![1, 1, 1, 2, 2, 3, 3, 3, 3, 4])
//!     .build()
//!     .unwrap();
//! let mut selection = Selection::new(Arc::new(table));
//! selection.select_range(Criteria::new().with("scan", (2, 3))).unwrap();
//! selection.select(Criteria::new().with("scan", 3).tagged("last")).unwrap();
//! assert_eq!(selection.finalize().len(), 4);
//! println!("{}", selection.show());
//! ```
//!
//! ## Logging
//! Rule additions and removals are reported through `tracing` at `info`, selections that
//! match nothing at `warn`. Install any subscriber to see them.

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

pub mod alias;
pub mod channel;
pub mod config;
pub mod error;
pub mod report;
pub mod rule;
pub mod sanitize;
pub mod selection;
pub mod table;
pub mod validate;
pub mod value;

pub type ColumnHasher = BuildHasherDefault<SeaHasher>;

pub use config::Settings;
pub use error::{Result, SelectionError};
pub use report::Report;
pub use rule::{Rule, RuleId, RuleStore};
pub use selection::{Criteria, Selection};
pub use table::{Cell, Column, ColumnKind, Table, TableBuilder, TableView};
pub use value::{Quantity, Unit, Value};
