//! Search conditions.

use std::cmp::Ordering;
use std::fmt;

/// Comparison applied between a field value and a search value.
///
/// The discriminants are the interop codes of the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Condition {
    /// field == value
    Equal = 1,
    /// field != value
    NotEqual = 2,
    /// field < value
    Less = 4,
    /// field > value
    Greater = 8,
    /// field <= value
    LessEqual = 16,
    /// field >= value
    GreaterEqual = 32,
}

impl Condition {
    /// Interop code of the condition.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse an interop code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Condition::Equal),
            2 => Some(Condition::NotEqual),
            4 => Some(Condition::Less),
            8 => Some(Condition::Greater),
            16 => Some(Condition::LessEqual),
            32 => Some(Condition::GreaterEqual),
            _ => None,
        }
    }

    /// Whether `field.cmp(value) == ordering` satisfies the condition.
    #[inline]
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Condition::Equal => ordering == Ordering::Equal,
            Condition::NotEqual => ordering != Ordering::Equal,
            Condition::Less => ordering == Ordering::Less,
            Condition::Greater => ordering == Ordering::Greater,
            Condition::LessEqual => ordering != Ordering::Greater,
            Condition::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Condition::Equal => "==",
            Condition::NotEqual => "!=",
            Condition::Less => "<",
            Condition::Greater => ">",
            Condition::LessEqual => "<=",
            Condition::GreaterEqual => ">=",
        };
        f.write_str(op)
    }
}
