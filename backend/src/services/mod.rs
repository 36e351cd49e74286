//! Business logic services for the Kiosk Management Platform

pub mod alerts;
pub mod deduction;
pub mod ingredients;
pub mod movements;
pub mod notifier;
pub mod recipes;
pub mod reporting;

pub use alerts::AlertService;
pub use deduction::DeductionService;
pub use ingredients::IngredientService;
pub use movements::MovementService;
pub use notifier::AlertNotifier;
pub use recipes::RecipeService;
pub use reporting::ReportingService;
