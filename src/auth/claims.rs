use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token payload. There is no server-side session state; the
/// signature and expiry are the whole credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // user ID
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
