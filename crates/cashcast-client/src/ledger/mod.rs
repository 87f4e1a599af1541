pub mod period;
mod types;

pub use types::{
    Bank, Bill, BillUpdate, Book, LedgerKind, LedgerRecord, LedgerRecordUpdate, Organization,
    PaymentType, TransactionDraft,
};
