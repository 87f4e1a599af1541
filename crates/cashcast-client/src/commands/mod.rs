pub mod bills;
pub(crate) mod common;
pub mod organizations;
pub mod projections;
pub mod recurring;
pub mod transactions;
