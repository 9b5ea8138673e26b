//! Core library for ketoplan: meal plan types, response parsing, plan
//! validation, prompt construction and the model requester.

pub mod plan;
pub mod prices;
pub mod report;
pub mod request;
pub mod session;
pub mod targets;
pub mod validate;
