mod auth_service_impl;
mod user_service_impl;

pub use auth_service_impl::*;
pub use user_service_impl::*;
