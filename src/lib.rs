#![doc = include_str!("../README.md")]

pub mod cli;
pub mod controller;
pub mod error;
pub mod extract;
pub mod run;
pub mod services;
pub mod types;

pub use controller::*;
pub use error::*;
pub use services::*;
pub use types::*;
