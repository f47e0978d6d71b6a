//! Session establishment: password login, remember-me tokens, and the
//! transport that carries a session between requests.

pub mod authenticator;
pub mod remember;
pub mod transport;

pub use authenticator::CredentialAuthenticator;
pub use remember::RememberTokenManager;
pub use transport::{MemoryTransport, SessionTransport};
