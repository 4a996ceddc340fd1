//! Request authentication
//!
//! Identity is established upstream. The hub checks the shared passphrase
//! and resolves the user named in `X-User-ID`.

pub mod api_key;
