pub mod order_records;

pub use order_records::OrderStatus;
