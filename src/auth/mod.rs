//! Identity for requests. Tokens are issued by the hosted auth provider; this
//! service only verifies them.

mod claims;
pub(crate) mod extractors;

pub use claims::{verify_access_token, Claims};
pub use extractors::{AuthUser, MaybeAuthUser};
