//! HTTP handlers for the gossip surface: `/info`, `/chain`,
//! `/transaction`, `/block` (spec.md §4.8/§6).

mod block;
mod chain;
mod info;
mod transaction;

pub use block::post_block;
pub use chain::get_chain;
pub use info::get_info;
pub use transaction::post_transaction;
