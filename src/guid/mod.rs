//! Interface identities.
//!
//! Every type and function that crosses the client/library boundary is
//! identified by a 16-byte [`InterfaceGuid`]. The numeric values live in
//! [`alias`] and are the only contract both sides must compile against;
//! no struct layout beyond the link table record is shared.

pub mod alias;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 128-bit identity of an interface, function signature or record type.
///
/// Only equality and hashing are meaningful. The byte order is the
/// big-endian order of the canonical text form.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterfaceGuid([u8; 16]);

impl InterfaceGuid {
    /// The all-zero identity. Never assigned to an interface.
    pub const NIL: InterfaceGuid = InterfaceGuid([0; 16]);

    /// Build an identity from its raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Build an identity from a 128-bit integer, most significant byte first.
    ///
    /// This is the form used by the constants in [`alias`]:
    /// `0x7578_6775_6901_4001_8000_0000_0000_0001` reads the same as the
    /// text form `75786775-6901-4001-8000-000000000001`.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The identity as a 128-bit integer.
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Whether this is [`InterfaceGuid::NIL`].
    pub const fn is_nil(&self) -> bool {
        self.as_u128() == 0
    }
}

impl fmt::Display for InterfaceGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-\
             {:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12],
            b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for InterfaceGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match alias::name_of(self) {
            Some(name) => write!(f, "InterfaceGuid({self} {name})"),
            None => write!(f, "InterfaceGuid({self})"),
        }
    }
}

/// Error returned when parsing the text form of an [`InterfaceGuid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuidParseError {
    /// The input does not have the 8-4-4-4-12 shape.
    #[error("malformed interface guid `{0}`: expected xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")]
    Malformed(String),

    /// A character outside `[0-9a-fA-F]` was found.
    #[error("invalid hex digit {digit:?} in interface guid `{input}`")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// The full input.
        input: String,
    },
}

impl FromStr for InterfaceGuid {
    type Err = GuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

        let groups: Vec<&str> = s.split('-').collect();
        if groups.len() != GROUPS.len()
            || groups.iter().zip(GROUPS).any(|(g, len)| g.len() != len)
        {
            return Err(GuidParseError::Malformed(s.to_string()));
        }

        let mut value: u128 = 0;
        for c in groups.concat().chars() {
            let digit = c.to_digit(16).ok_or_else(|| GuidParseError::InvalidDigit {
                digit: c,
                input: s.to_string(),
            })?;
            value = (value << 4) | u128::from(digit);
        }
        Ok(Self::from_u128(value))
    }
}

impl From<[u8; 16]> for InterfaceGuid {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_size() {
        assert_eq!(std::mem::size_of::<InterfaceGuid>(), 16);
        assert_eq!(std::mem::align_of::<InterfaceGuid>(), 1);
    }

    #[test]
    fn test_display_matches_u128_constant() {
        let guid = InterfaceGuid::from_u128(0x7578_6775_6901_4001_8000_0000_0000_0001);
        assert_eq!(guid.to_string(), "75786775-6901-4001-8000-000000000001");
    }

    #[test]
    fn test_parse_text_form() {
        let guid: InterfaceGuid = "75786775-6901-4001-8000-00000000000A".parse().unwrap();
        assert_eq!(guid.as_u128(), 0x7578_6775_6901_4001_8000_0000_0000_000a);
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        let err = "75786775-6901-4001-8000".parse::<InterfaceGuid>().unwrap_err();
        assert!(matches!(err, GuidParseError::Malformed(_)));

        let err = "7578677-56901-4001-8000-000000000001"
            .parse::<InterfaceGuid>()
            .unwrap_err();
        assert!(matches!(err, GuidParseError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_bad_digit() {
        let err = "7578677g-6901-4001-8000-000000000001"
            .parse::<InterfaceGuid>()
            .unwrap_err();
        assert!(matches!(err, GuidParseError::InvalidDigit { digit: 'g', .. }));
    }

    #[test]
    fn test_nil() {
        assert!(InterfaceGuid::NIL.is_nil());
        assert!(InterfaceGuid::default().is_nil());
        assert!(!alias::FN_SAVE.is_nil());
    }

    #[test]
    fn test_debug_names_known_aliases() {
        let debug = format!("{:?}", alias::FN_SAVE);
        assert!(debug.contains("FN_SAVE"));
    }
}
