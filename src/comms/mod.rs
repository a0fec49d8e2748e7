pub mod local_api;
