//! Secret values, such as API tokens, which should never be logged.

use std::{borrow::Cow, env::VarError, fmt, ops::Deref};

use http::{header::InvalidHeaderValue, HeaderValue};
use thiserror::Error;
use zeroize::Zeroize;

/// A secret could not be read from the environment.
#[derive(Debug, Error)]
pub enum MissingSecret {
    /// The variable is not set (or is not unicode).
    #[error("'{0}' is required")]
    Unset(String, #[source] VarError),

    /// The variable is set, but to an empty string.
    #[error("'{0}' is required, but is empty")]
    Empty(String),
}

/// An API token for a service. Generally any semi-secret item.
///
/// This wrapper just prevents the token from appearing in debug reprs,
/// and zeroes owned memory when dropped.
///
/// Use [Secret::revealed] to get the underlying value.
#[derive(Clone)]
pub struct Secret(Cow<'static, str>);

impl Secret {
    /// Read the secret named `var` using a variable lookup function, such as
    /// `std::env::var`.
    ///
    /// Unset and empty variables are both errors.
    pub fn from_lookup<F>(var: &str, lookup: F) -> Result<Self, MissingSecret>
    where
        F: FnOnce(&str) -> Result<String, VarError>,
    {
        let value = lookup(var).map_err(|err| MissingSecret::Unset(var.to_owned(), err))?;
        if value.trim().is_empty() {
            return Err(MissingSecret::Empty(var.to_owned()));
        }
        Ok(Secret(value.into()))
    }

    /// Expose the underlying value of this secret
    pub fn revealed(&self) -> &str {
        self.0.deref()
    }

    /// An `Authorization: Bearer` header value for this secret.
    pub fn bearer(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::try_from(format!("Bearer {}", self.revealed()))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        if let Cow::Owned(ref mut s) = self.0 {
            s.zeroize()
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value.into())
    }
}

impl From<&'static str> for Secret {
    fn from(value: &'static str) -> Self {
        Secret(value.into())
    }
}
