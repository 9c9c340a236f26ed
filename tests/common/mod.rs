pub mod contract;
pub mod scripted_store;
