//! Data model shared by the normalizer, resolver and controller

pub mod errors;
pub mod request;
