//! HTTP handlers for the Kiosk Management Platform

pub mod alerts;
pub mod deduction;
pub mod health;
pub mod ingredients;
pub mod movements;
pub mod recipes;
pub mod reporting;

pub use alerts::*;
pub use deduction::*;
pub use health::*;
pub use ingredients::*;
pub use movements::*;
pub use recipes::*;
pub use reporting::*;
