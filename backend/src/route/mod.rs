pub mod auth;
pub mod playlist;
pub mod recommend;

use crate::error::{Error, Result};
use crate::Opt;

/// Resolve the requested recommendation cap against the configured default.
pub(crate) fn effective_limit(requested: Option<usize>, opt: &Opt) -> Result<usize> {
    match requested {
        Some(0) => Err(Error::BadRequest(
            "number_of_recs must be at least 1".into(),
        )),
        Some(n) => Ok(n),
        None => Ok(opt.default_recommendation_count),
    }
}
