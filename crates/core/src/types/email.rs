//! Email addresses entered at signup.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Why an address was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Please enter your email address")]
    Empty,

    #[error("Email address must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Email address must contain an @")]
    MissingAtSymbol,

    #[error("Email address must contain only one @")]
    MultipleAtSymbols,

    #[error("Email address is missing the part before the @")]
    EmptyLocalPart,

    #[error("Email address is missing the domain after the @")]
    EmptyDomain,
}

/// A signup email address.
///
/// Only the shape is checked here (`name@domain`, at most 254 characters).
/// Whether the address is taken or deliverable is for the server to decide.
///
/// ```
/// use doghouse_core::Email;
///
/// assert!(Email::parse("juan@doghouse.ph").is_ok());
/// assert!(Email::parse("juan@dela@cruz.ph").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address accepted, per the SMTP path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Check the shape of `input` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmailError`] that applies.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        if input.is_empty() {
            return Err(EmailError::Empty);
        }
        if input.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (name, domain) = input.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }
        if name.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(input.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        for address in [
            "juan@doghouse.ph",
            "maria.santos+orders@gmail.com",
            "a@b.c",
        ] {
            assert_eq!(Email::parse(address).unwrap().as_str(), address);
        }
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("juan.doghouse.ph"), Err(EmailError::MissingAtSymbol));
        assert_eq!(
            Email::parse("juan@dela@cruz.ph"),
            Err(EmailError::MultipleAtSymbols)
        );
        assert_eq!(Email::parse("@doghouse.ph"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("juan@"), Err(EmailError::EmptyDomain));
    }

    #[test]
    fn test_length_limit() {
        let domain = "@doghouse.ph";
        let fits = format!("{}{domain}", "j".repeat(Email::MAX_LENGTH - domain.len()));
        assert!(Email::parse(&fits).is_ok());

        let over = format!("j{fits}");
        assert_eq!(
            Email::parse(&over),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "juan@doghouse.ph".parse().unwrap();
        assert_eq!(email.to_string(), "juan@doghouse.ph");
        assert_eq!(
            serde_json::to_string(&email).unwrap(),
            "\"juan@doghouse.ph\""
        );
    }
}
