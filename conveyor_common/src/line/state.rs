//! State enums for the conveyor line.
//!
//! `SystemState` is the single global control state. `FaultCode` identifies
//! the active fault and is `None` exactly when the state is not `Fault`.
//! `Photoeye` names the four sensing points in jam-priority order.

use core::fmt;

use serde::{Deserialize, Serialize};

// ─── Run Mode ───────────────────────────────────────────────────────

/// Submode carried by `SystemState::Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunMode {
    /// Belt runs and diverter actuates automatically.
    #[default]
    Auto = 0,
    /// Belt follows the hold-to-run jog input; diverter held retracted.
    Manual = 1,
}

impl RunMode {
    /// Mode-selector level mapping: `false` = Auto, `true` = Manual.
    #[inline]
    pub const fn from_selector(manual: bool) -> Self {
        if manual { Self::Manual } else { Self::Auto }
    }
}

// ─── System State ───────────────────────────────────────────────────

/// Global control state of the line.
///
/// Exactly one value at a time. The process starts in `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SystemState {
    /// Belt idle, waiting for a start request.
    #[default]
    Stopped,
    /// Pre-run delay; photoeyes must stay clear.
    Starting,
    /// Belt in operation.
    Running(RunMode),
    /// Latched fault; requires resolution and acknowledge.
    Fault,
}

impl SystemState {
    /// Display state code (0 = Stopped, 1 = Starting, 2 = Running, 3 = Fault).
    #[inline]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Starting => 1,
            Self::Running(_) => 2,
            Self::Fault => 3,
        }
    }

    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    #[inline]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault)
    }

    /// Submode when running, `None` otherwise.
    #[inline]
    pub const fn run_mode(&self) -> Option<RunMode> {
        match self {
            Self::Running(mode) => Some(*mode),
            _ => None,
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "STOPPED"),
            Self::Starting => write!(f, "STARTING"),
            Self::Running(RunMode::Auto) => write!(f, "RUNNING(AUTO)"),
            Self::Running(RunMode::Manual) => write!(f, "RUNNING(MANUAL)"),
            Self::Fault => write!(f, "FAULT"),
        }
    }
}

// ─── Fault Code ─────────────────────────────────────────────────────

/// Active fault identity.
///
/// Invariant: `FaultCode::None` iff the system state is not `Fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FaultCode {
    #[default]
    None = 0,
    EStop = 1,
    JamInfeed = 2,
    JamDiverter = 3,
    JamOutfeedB = 4,
    JamOutfeedC = 5,
}

impl FaultCode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::EStop),
            2 => Some(Self::JamInfeed),
            3 => Some(Self::JamDiverter),
            4 => Some(Self::JamOutfeedB),
            5 => Some(Self::JamOutfeedC),
            _ => None,
        }
    }

    /// Fixed operator message for this code (empty for `None`).
    pub const fn message(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::EStop => "E-Stop Activated",
            Self::JamInfeed => "Jam at Infeed",
            Self::JamDiverter => "Jam at Diverter",
            Self::JamOutfeedB => "Jam at Outfeed B",
            Self::JamOutfeedC => "Jam at Outfeed C",
        }
    }

    /// Returns true for the jam codes (2–5).
    #[inline]
    pub const fn is_jam(&self) -> bool {
        matches!(
            self,
            Self::JamInfeed | Self::JamDiverter | Self::JamOutfeedB | Self::JamOutfeedC
        )
    }

    /// Location of a jam fault, `None` for non-jam codes.
    #[inline]
    pub const fn photoeye(&self) -> Option<Photoeye> {
        match self {
            Self::JamInfeed => Some(Photoeye::Infeed),
            Self::JamDiverter => Some(Photoeye::Diverter),
            Self::JamOutfeedB => Some(Photoeye::OutfeedB),
            Self::JamOutfeedC => Some(Photoeye::OutfeedC),
            Self::None | Self::EStop => None,
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", *self as u8, self.message())
    }
}

// ─── Photoeye ───────────────────────────────────────────────────────

/// Photoeye location on the line.
///
/// Declaration order is the jam priority: lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Photoeye {
    Infeed = 0,
    Diverter = 1,
    OutfeedB = 2,
    OutfeedC = 3,
}

impl Photoeye {
    /// All photoeyes in priority order.
    pub const ALL: [Self; 4] = [Self::Infeed, Self::Diverter, Self::OutfeedB, Self::OutfeedC];

    /// Array index (0..4).
    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Fault code raised when this photoeye jams.
    #[inline]
    pub const fn jam_code(&self) -> FaultCode {
        match self {
            Self::Infeed => FaultCode::JamInfeed,
            Self::Diverter => FaultCode::JamDiverter,
            Self::OutfeedB => FaultCode::JamOutfeedB,
            Self::OutfeedC => FaultCode::JamOutfeedC,
        }
    }
}

impl fmt::Display for Photoeye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeed => write!(f, "infeed"),
            Self::Diverter => write!(f, "diverter"),
            Self::OutfeedB => write!(f, "outfeed_b"),
            Self::OutfeedC => write!(f, "outfeed_c"),
        }
    }
}
