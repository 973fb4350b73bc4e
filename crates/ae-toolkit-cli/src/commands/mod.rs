pub mod credit_limit;
pub mod deals;
pub mod murabahah;
pub mod profit;
