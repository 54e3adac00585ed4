//! Bearer JWT authentication against the platform identity provider.
//!
//! Token issuance lives in the external identity service; this module only
//! validates incoming access tokens (RS256, keys fetched from the issuer's
//! JWKS endpoint and cached) and exposes the authenticated principal.

pub mod jwks;
pub mod model;
pub mod validator;

pub use jwks::JwksClient;
pub use validator::JwtValidator;
