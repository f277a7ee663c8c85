pub mod appointment;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;
