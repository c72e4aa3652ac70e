//! Permission mode algebra for `chmod`
//!
//! A mode spec is either an octal number (`755`) or a comma separated list
//! of symbolic clauses (`u+x,g-w,a=r`). Each clause is `[ugoa]*[+-=][rwx]+`.
//! Applying a spec only ever touches the low nine permission bits; file
//! type bits (and setuid/setgid/sticky) are carried over unchanged.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Permission classes a clause applies to
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Who: u8 {
        const USER  = 0b001;
        const GROUP = 0b010;
        const OTHER = 0b100;
        const ALL   = Self::USER.bits() | Self::GROUP.bits() | Self::OTHER.bits();
    }
}

bitflags! {
    /// Permission bits within one class, laid out as in an octal digit
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Perms: u8 {
        const READ    = 0b100;
        const WRITE   = 0b010;
        const EXECUTE = 0b001;
    }
}

impl Who {
    /// Expand into a 9-bit mask holding `perms` for every selected class
    fn mask(self, perms: Perms) -> u32 {
        let p = perms.bits() as u32;
        let mut mask = 0;
        if self.contains(Who::USER) {
            mask |= p << 6;
        }
        if self.contains(Who::GROUP) {
            mask |= p << 3;
        }
        if self.contains(Who::OTHER) {
            mask |= p;
        }
        mask
    }
}

/// Raw `st_mode` value: type bits plus permission bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileMode(u32);

impl FileMode {
    pub const PERMISSION_MASK: u32 = 0o777;
    pub const TYPE_MASK: u32 = 0o170000;
    pub const DIRECTORY: u32 = 0o040000;
    pub const REGULAR: u32 = 0o100000;
    pub const SYMLINK: u32 = 0o120000;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Low nine permission bits
    pub const fn permissions(self) -> u32 {
        self.0 & Self::PERMISSION_MASK
    }

    pub const fn file_type(self) -> u32 {
        self.0 & Self::TYPE_MASK
    }

    /// Replace the permission bits, keeping everything else
    pub const fn with_permissions(self, perms: u32) -> Self {
        Self((self.0 & !Self::PERMISSION_MASK) | (perms & Self::PERMISSION_MASK))
    }

    /// `rwxr-xr-x` form of the permission bits
    pub fn permission_string(self) -> String {
        let mut out = String::with_capacity(9);
        for shift in [6, 3, 0] {
            let digit = Perms::from_bits_truncate(((self.0 >> shift) & 0o7) as u8);
            out.push(if digit.contains(Perms::READ) { 'r' } else { '-' });
            out.push(if digit.contains(Perms::WRITE) { 'w' } else { '-' });
            out.push(if digit.contains(Perms::EXECUTE) { 'x' } else { '-' });
        }
        out
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.permissions())
    }
}

/// Symbolic clause operator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Remove,
    Set,
}

impl Op {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Op::Add),
            '-' => Some(Op::Remove),
            '=' => Some(Op::Set),
            _ => None,
        }
    }
}

/// One `who op perms` unit of a symbolic spec
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clause {
    pub who: Who,
    pub op: Op,
    pub perms: Perms,
}

impl Clause {
    pub fn apply(&self, mode: FileMode) -> FileMode {
        let bits = self.who.mask(self.perms);
        let perms = mode.permissions();
        let updated = match self.op {
            Op::Add => perms | bits,
            Op::Remove => perms & !bits,
            // Clear every bit of the selected classes first, then set the requested ones
            Op::Set => (perms & !self.who.mask(Perms::all())) | bits,
        };
        mode.with_permissions(updated)
    }
}

impl FromStr for Clause {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars().peekable();

        let mut who = Who::empty();
        while let Some(&ch) = chars.peek() {
            let class = match ch {
                'u' => Who::USER,
                'g' => Who::GROUP,
                'o' => Who::OTHER,
                'a' => Who::ALL,
                _ => break,
            };
            who |= class;
            chars.next();
        }
        if who.is_empty() {
            who = Who::ALL;
        }

        let op = chars
            .next()
            .and_then(Op::from_char)
            .ok_or_else(|| ModeError::MissingOperator(s.to_string()))?;

        let mut perms = Perms::empty();
        for ch in chars {
            perms |= match ch {
                'r' => Perms::READ,
                'w' => Perms::WRITE,
                'x' => Perms::EXECUTE,
                found => {
                    return Err(ModeError::InvalidPermission {
                        clause: s.to_string(),
                        found,
                    })
                }
            };
        }
        if perms.is_empty() {
            return Err(ModeError::EmptyPermissions(s.to_string()));
        }

        Ok(Clause { who, op, perms })
    }
}

/// Structured failure of the mode grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("invalid mode: empty mode")]
    Empty,

    #[error("invalid mode: '{0}'")]
    InvalidNumeric(String),

    #[error("invalid mode: '{0}': expected one of '+', '-', '='")]
    MissingOperator(String),

    #[error("invalid mode: '{clause}': unexpected '{found}'")]
    InvalidPermission { clause: String, found: char },

    #[error("invalid mode: '{0}': no permissions given")]
    EmptyPermissions(String),
}

/// A parsed mode spec
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModeSpec {
    Numeric(u32),
    Symbolic(Vec<Clause>),
}

impl ModeSpec {
    /// Compute the new mode from `mode`. Clauses fold left to right.
    pub fn apply(&self, mode: FileMode) -> FileMode {
        match self {
            ModeSpec::Numeric(perms) => mode.with_permissions(*perms),
            ModeSpec::Symbolic(clauses) => clauses.iter().fold(mode, |acc, c| c.apply(acc)),
        }
    }
}

impl FromStr for ModeSpec {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ModeError::Empty);
        }

        if s.chars().all(|c| c.is_ascii_digit()) {
            let value = u32::from_str_radix(s, 8)
                .map_err(|_| ModeError::InvalidNumeric(s.to_string()))?;
            if value > FileMode::PERMISSION_MASK {
                return Err(ModeError::InvalidNumeric(s.to_string()));
            }
            return Ok(ModeSpec::Numeric(value));
        }

        let clauses = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Clause::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if clauses.is_empty() {
            return Err(ModeError::Empty);
        }
        Ok(ModeSpec::Symbolic(clauses))
    }
}

/// Parse `spec` and apply it to `mode`
#[allow(dead_code)]
pub fn apply(spec: &str, mode: FileMode) -> Result<FileMode, ModeError> {
    Ok(spec.parse::<ModeSpec>()?.apply(mode))
}
