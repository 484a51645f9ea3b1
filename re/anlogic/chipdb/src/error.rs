use std::fmt;

use crate::keystream::CipherError;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Section {
    Header,
    Architecture,
    Routing,
    LegacyRouting,
    Models,
    Names,
    Constraints,
    Pack,
    TimingLib,
    Serdes,
    BccInfo,
    BilInfo,
    Trailer,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::Architecture => "architecture",
            Section::Routing => "routing",
            Section::LegacyRouting => "legacy routing",
            Section::Models => "models",
            Section::Names => "names",
            Section::Constraints => "constraints",
            Section::Pack => "pack",
            Section::TimingLib => "TimingLib",
            Section::Serdes => "serdes",
            Section::BccInfo => "bcc_info",
            Section::BilInfo => "bil_info",
            Section::Trailer => "trailer",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ViolationKind {
    UnexpectedEof,
    MissingField { index: usize, len: usize },
    Cipher(CipherError),
    BadNumber { index: usize, value: String },
    TagMismatch { expected: &'static str, found: String },
    NotZero { index: usize, value: String },
    IndexEcho { expected: String, found: String },
    NotEmpty { fields: usize },
    CountMismatch { expected: usize, found: usize },
    TotalMismatch { declared: usize, counted: usize },
    BadFlag { name: &'static str, value: String },
    RemapType { remap: bool, kind: String },
    BadModelSelector(u32),
    OutsideGrid { x: u32, y: u32 },
    DuplicateCell { x: u32, y: u32 },
    PlaceholderExtent,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::UnexpectedEof => write!(f, "unexpected end of file"),
            ViolationKind::MissingField { index, len } => {
                write!(f, "field {index} missing from a {len}-field line")
            }
            ViolationKind::Cipher(e) => write!(f, "{e}"),
            ViolationKind::BadNumber { index, value } => {
                write!(f, "field {index} is not a number: {value:?}")
            }
            ViolationKind::TagMismatch { expected, found } => {
                write!(f, "expected tag {expected:?}, found {found:?}")
            }
            ViolationKind::NotZero { index, value } => {
                write!(f, "field {index} must be zero, found {value:?}")
            }
            ViolationKind::IndexEcho { expected, found } => {
                write!(f, "index echo mismatch: expected {expected}, found {found}")
            }
            ViolationKind::NotEmpty { fields } => {
                write!(f, "expected empty sentinel line, found {fields} fields")
            }
            ViolationKind::CountMismatch { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            ViolationKind::TotalMismatch { declared, counted } => {
                write!(f, "declared {declared} instances, counted {counted}")
            }
            ViolationKind::BadFlag { name, value } => {
                write!(f, "flag {name} must be 0 or 1, found {value:?}")
            }
            ViolationKind::RemapType { remap, kind } => {
                write!(f, "remap={} inconsistent with type {kind:?}", u8::from(*remap))
            }
            ViolationKind::BadModelSelector(sel) => write!(f, "unknown model selector {sel}"),
            ViolationKind::OutsideGrid { x, y } => write!(f, "cell x{x}y{y} outside the grid"),
            ViolationKind::DuplicateCell { x, y } => write!(f, "cell x{x}y{y} listed twice"),
            ViolationKind::PlaceholderExtent => {
                write!(f, "placeholder instance with non-zero extent or address")
            }
        }
    }
}

/// A fatal grammar failure, located by section, record within the section
/// and 1-based input line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormatViolation {
    pub kind: ViolationKind,
    pub section: Section,
    pub record: usize,
    pub line: usize,
}

impl fmt::Display for FormatViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} record {}: {}",
            self.line, self.section, self.record, self.kind
        )
    }
}

impl std::error::Error for FormatViolation {}

#[derive(Debug)]
pub enum DecodeError {
    Format(FormatViolation),
    Io(std::io::Error),
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FormatViolation> for DecodeError {
    fn from(value: FormatViolation) -> Self {
        Self::Format(value)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Format(v) => write!(f, "format violation at {v}"),
            DecodeError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Format(v) => Some(v),
            DecodeError::Io(e) => Some(e),
        }
    }
}
