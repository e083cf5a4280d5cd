//! Identity abstraction used by the session/auth layer.
//!
//! Anything that can back a persistent session implements [`Identity`];
//! the HTTP middleware only ever talks to this trait.

pub mod token;

/// An authenticated principal with a persistent-session key.
pub trait Identity {
    /// Primary key of the account.
    fn id(&self) -> i32;

    /// Opaque token stored in the "remember me" cookie.
    fn auth_key(&self) -> &str;

    /// Equality check between the stored auth key and a cookie candidate.
    fn validate_auth_key(&self, candidate: &str) -> bool {
        self.auth_key() == candidate
    }
}
