//! Capability bit-sets for device execution and tracker initialization.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Set of capabilities executed by the device for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecFlags(u32);

impl ExecFlags {
    pub const NONE: Self = Self(0);
    pub const BODY: Self = Self(0x001);
    pub const HAND: Self = Self(0x002);
    pub const FACE: Self = Self(0x004);
    pub const DIRECTION: Self = Self(0x008);
    pub const AGE: Self = Self(0x010);
    pub const GENDER: Self = Self(0x020);
    pub const GAZE: Self = Self(0x040);
    pub const BLINK: Self = Self(0x080);
    pub const EXPRESSION: Self = Self(0x100);
    pub const RECOGNITION: Self = Self(0x200);
    pub const VERIFICATION: Self = Self(0x400);

    /// Every capability that produces a per-face record.
    pub const FACE_ANY: Self = Self(0x7fc);

    /// Detection and estimation run of the sample program.
    pub const ESTIMATION: Self = Self(0x1ff);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0x7ff)
    }

    /// True when every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ExecFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExecFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ExecFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ExecFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03x}", self.0)
    }
}

/// Functions a stabilizing tracker is initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StabilizeFlags(u32);

impl StabilizeFlags {
    pub const NONE: Self = Self(0);
    pub const BODY: Self = Self(0x01);
    pub const FACE: Self = Self(0x04);
    pub const DIRECTION: Self = Self(0x08);
    pub const AGE: Self = Self(0x10);
    pub const GENDER: Self = Self(0x20);
    pub const RECOGNITION: Self = Self(0x200);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0x23d)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for StabilizeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for StabilizeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03x}", self.0)
    }
}
