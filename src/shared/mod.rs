pub mod constants;
pub mod templates;
pub mod validation;
