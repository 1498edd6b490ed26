//! Data Transfer Objects for REST response serialization.

pub mod meeting_dto;

pub use meeting_dto::*;
