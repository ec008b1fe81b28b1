//! Session-authenticate wire types
//!
//! - [`AuthPayload`]: what the requester asks to be signed
//! - [`Cacao`]: what each account returns
//! - [`RecapUrn`]: capability grants embedded in resources
//! - [`AuthError`]: wire-level failure codes

pub mod cacao;
pub mod error;
pub mod params;
pub mod payload;
pub mod recap;

pub use cacao::{Cacao, CacaoFormat, CacaoHeader, CacaoPayload, CacaoSignature, CacaoSignatureType};
pub use error::AuthError;
pub use params::{SessionAuthenticateRequestParams, SessionAuthenticateResponseParams};
pub use payload::AuthPayload;
pub use recap::{RecapData, RecapUrn};
