pub mod account;
pub mod cart;
pub mod errors;
pub mod order;
pub mod pending;
pub mod ports;
pub mod product;
pub mod session;
pub mod stock;
