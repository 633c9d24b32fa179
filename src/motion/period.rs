use std::f64::consts::TAU;

use crate::foundation::error::{KasuError, KasuResult};

/// A strictly positive, finite number of seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct PositiveSecs(f64);

impl PositiveSecs {
    /// The wrapped value in seconds.
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Duration of one full motion cycle.
///
/// A configured period of `0` means "no motion" and is represented as [`Period::Static`], so
/// no caller ever divides by a zero period.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Period {
    /// The motion is disabled.
    #[default]
    Static,
    /// One cycle takes this many seconds.
    Finite(PositiveSecs),
}

impl Period {
    /// Interpret a configured period in seconds.
    ///
    /// `0` maps to [`Period::Static`]; negative or non-finite values are rejected with
    /// [`KasuError::DegenerateMotionPeriod`] naming `field`.
    pub fn from_secs(field: &'static str, secs: f64) -> KasuResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(KasuError::DegenerateMotionPeriod { field, secs });
        }
        if secs == 0.0 {
            return Ok(Self::Static);
        }
        Ok(Self::Finite(PositiveSecs(secs)))
    }

    /// Period in seconds, `0` for [`Period::Static`].
    pub fn secs(self) -> f64 {
        match self {
            Self::Static => 0.0,
            Self::Finite(p) => p.get(),
        }
    }

    /// `true` when the motion is disabled.
    pub fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }

    /// Accumulated angle `2πt / period` at time `t`; always `0` when static.
    pub fn angle_at(self, t: f64) -> f64 {
        match self {
            Self::Static => 0.0,
            Self::Finite(p) => TAU * t / p.get(),
        }
    }
}
