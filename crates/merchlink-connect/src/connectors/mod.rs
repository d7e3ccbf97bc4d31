//! # Domain Connectors
//!
//! Typed facades over [`ConnectorBase`](crate::dispatch::ConnectorBase), one
//! per host service. Each validates arguments locally and fails fast with a
//! `Validation` error - no round trip is made for a violating argument.
//!
//! Connectors are cheap to clone; `with_cancel` derives a connector whose
//! calls observe the given cancellation token.

mod inventory;
mod merchant;
mod order;
mod printer;
mod tender;

pub use inventory::InventoryConnector;
pub use merchant::MerchantConnector;
pub use order::OrderConnector;
pub use printer::PrinterConnector;
pub use tender::TenderConnector;
