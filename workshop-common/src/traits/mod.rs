pub mod store_traits;

pub use store_traits::{decode_all, Document, LedgerStore, LedgerStoreExt};
