//! Identity newtypes with a strict charset, and the digest type.
//!
//! All cross-entity references in the engine are identity-based; these tokens
//! are the only join keys. Lexicographic order on the underlying string is the
//! canonical iteration order everywhere a deterministic walk is required.

use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn is_token(s: &str) -> bool {
    let len = s.len();
    if !(1..=64).contains(&len) {
        return false;
    }
    s.bytes().all(|b| {
        matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        )
    })
}

fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

macro_rules! def_token {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_token(s) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(ParseError::InvalidToken)
                }
            }
        }
    };
}

def_token!(EventId, "Identity of a bounded review event.");
def_token!(UserId, "Identity of a registered user (admin or participant).");
def_token!(AttachmentId, "Identity of a submitted proposal file.");
def_token!(AssignmentId, "Identity of a participant's review assignment.");
def_token!(VoteId, "Identity of a single ranked vote row.");

/// 64-hex lowercase digest (results fingerprint).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sha256(String);

impl Sha256 {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256 {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_lower_hex_len(s, 64) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseError::InvalidHex)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_charset_enforced() {
        assert!("evt-2024.review:1".parse::<EventId>().is_ok());
        assert!("".parse::<EventId>().is_err());
        assert!("has space".parse::<EventId>().is_err());
        assert!("x".repeat(65).parse::<EventId>().is_err());
    }

    #[test]
    fn sha256_wants_64_lower_hex() {
        let ok = "a".repeat(64);
        assert!(ok.parse::<Sha256>().is_ok());
        assert!("A".repeat(64).parse::<Sha256>().is_err());
        assert!("a".repeat(63).parse::<Sha256>().is_err());
    }

    #[test]
    fn token_order_is_lexicographic() {
        let a: AttachmentId = "att-a".parse().unwrap();
        let b: AttachmentId = "att-b".parse().unwrap();
        assert!(a < b);
    }
}
