pub mod boltzmann;
pub mod clock;
pub mod config;
pub mod connection;
pub mod data;
pub mod error;
pub mod memory;
pub mod model;
pub mod module;
pub mod port;
