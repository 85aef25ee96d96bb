//! `ims-inventory` — products, the stock movement ledger, and the balance
//! updater that keeps them consistent.
//!
//! The on-hand quantity of a product is never edited directly: it only
//! changes through [`StockLedger::record_movement`], which appends an
//! immutable [`LedgerEntry`] and applies the balance change as one atomic
//! storage operation.

pub mod category;
pub mod ledger;
pub mod movement;
pub mod product;
pub mod report;
pub mod repository;
pub mod service;

pub use category::{Category, CategoryDirectory, CategoryId, CategoryRepository};
pub use ledger::{INITIAL_REFERENCE, LedgerEntry, TransactionId, replay};
pub use movement::{MovementKind, MovementMetadata, SaleInfo, plan_movement};
pub use product::{NewProduct, Product, ProductId, ProductPatch, UNITS};
pub use repository::{ProductRepository, QuantityChange, TransactionRepository};
pub use service::{MovementReceipt, StockLedger};
