pub mod internal_api;

pub use internal_api::InternalApiClient;
