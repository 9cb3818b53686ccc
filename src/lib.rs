// src/lib.rs

pub mod cells;
pub mod config;
pub mod effective_field;
pub mod energy;
pub mod error;
pub mod params;
pub mod vec3;
pub mod vector_field;
