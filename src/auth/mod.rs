// Token handling: JWT inspection, session storage, auth endpoints
mod client;
pub mod jwt;
mod store;

#[cfg(test)]
pub use client::MockAuthApi;
pub use client::{AuthApi, HttpAuthApi};
pub use store::{
    FileStore, MemoryStore, SessionStore, OPERARIO_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS,
    TOKEN_KEY, USER_KEY,
};
