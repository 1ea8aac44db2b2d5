pub mod gate;
pub mod jwks;
pub mod middleware;
pub mod resolver;

pub use jwks::{AuthError, Claims, JwksVerifier};
pub use resolver::{IdentityResolver, UnauthorizedError};
