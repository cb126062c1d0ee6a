pub mod mse;

pub use mse::{mean_error, squared_error};
