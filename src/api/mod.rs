pub mod client;

pub use client::{Api, ApiClient, ApiError};
