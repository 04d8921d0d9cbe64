//! Core building blocks: request parameters, tensor ownership and the
//! stylization processing stages. These are consumed by the high-level `api`
//! module.
pub mod params;
pub mod processing;
pub mod tensor;
