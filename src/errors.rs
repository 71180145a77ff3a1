//! Error kinds reported at the public boundary.
//!
//! All validation happens in the public API layer; the internal layers trust
//! their callers and surface only [`ClipError::Overflow`].

use std::fmt;

/// Everything that can go wrong in a `polyops` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipError {
    /// A numeric clip-type code outside the documented range.
    InvalidClipType,
    /// A numeric fill-rule code outside the documented range.
    InvalidFillRule,
    /// A numeric join-type code outside the documented range.
    InvalidJoinType,
    /// A numeric end-type code outside the documented range.
    InvalidEndType,
    /// A scalar parameter (epsilon, radius, point count) at or below zero
    /// where a positive value is required.
    InvalidParameter,
    /// An offset options record with an out-of-range field
    /// (`miter_limit < 1.0` or `arc_tolerance <= 0`).
    InvalidOptions,
    /// A rectangle path without exactly four axis-aligned vertices.
    InvalidRectangle,
    /// Minkowski convolution with a zero-length pattern or path.
    EmptyPath,
    /// Reserved for internal use; degenerate inputs are normally filtered
    /// silently rather than reported.
    DegeneratePolygon,
    /// Integer overflow detected inside a geometric predicate, or input
    /// coordinates beyond the supported range.
    Overflow,
    /// A 64-bit result does not fit the 32-bit mirror API.
    ResultOverflow,
    /// Placeholder for unsupported operations; never constructed by a
    /// finished build.
    NotImplemented,
}

impl ClipError {
    pub fn message(&self) -> &'static str {
        match self {
            ClipError::InvalidClipType => "clip type is outside the documented range",
            ClipError::InvalidFillRule => "fill rule is outside the documented range",
            ClipError::InvalidJoinType => "join type is outside the documented range",
            ClipError::InvalidEndType => "end type is outside the documented range",
            ClipError::InvalidParameter => "parameter must be greater than zero",
            ClipError::InvalidOptions => "offset options contain an out-of-range field",
            ClipError::InvalidRectangle => "rectangle must have exactly four vertices",
            ClipError::EmptyPath => "pattern and path must both be non-empty",
            ClipError::DegeneratePolygon => "polygon is degenerate",
            ClipError::Overflow => "coordinate values exceed the permitted range",
            ClipError::ResultOverflow => "result does not fit in 32-bit coordinates",
            ClipError::NotImplemented => "operation is not implemented",
        }
    }
}

impl fmt::Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "polyops: {}", self.message())
    }
}

impl std::error::Error for ClipError {}

pub type Result<T> = std::result::Result<T, ClipError>;
