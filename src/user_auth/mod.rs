//! User authentication: registration, login, JWT middleware.

pub mod handlers;
pub mod middleware;
pub mod service;

pub use service::{AuthError, AuthResponse, AuthService, Claims, LoginRequest, RegisterRequest};
