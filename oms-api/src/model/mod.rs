pub mod event;
pub mod ids;
pub mod order;
pub mod request;
