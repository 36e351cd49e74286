//! Domain models for the Kiosk Management Platform

mod alert;
mod deduction;
mod ingredient;
mod movement;
mod recipe;

pub use alert::*;
pub use deduction::*;
pub use ingredient::*;
pub use movement::*;
pub use recipe::*;
