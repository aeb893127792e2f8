pub mod db;

pub use db::{
    create_db, get_category_mappings, get_reconciliation, get_reconciliations, get_transaction,
    get_transactions, get_uncategorized_transactions, reapply_learned_mappings,
    save_category_mapping, save_reconciliation, save_transaction, save_transaction_with_mapping,
    teach_category_mapping, DbPool, StorageError, TransactionFilter,
};
