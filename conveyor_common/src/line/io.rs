//! Digital I/O images exchanged with the process once per scan.
//!
//! `InputSnapshot` is latched at the start of a scan and never mutated
//! afterwards. `OutputCommand` is computed whole and committed at the end.
//! Both have a packed `bitflags` form for transport.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use super::state::Photoeye;

bitflags! {
    /// Packed digital input bank (8 points).
    ///
    /// NC contacts (`STOP_OK`, `ESTOP_OK`) are `1` when healthy / not pressed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputBits: u8 {
        /// Start push-button (NO).
        const START       = 0x01;
        /// Stop push-button (NC, set = not pressed).
        const STOP_OK     = 0x02;
        /// Emergency stop circuit (NC, set = healthy).
        const ESTOP_OK    = 0x04;
        /// Mode selector (set = Manual).
        const MODE_MANUAL = 0x08;
        /// Infeed photoeye blocked.
        const PE_INFEED   = 0x10;
        /// Diverter photoeye blocked.
        const PE_DIVERTER = 0x20;
        /// Outfeed B photoeye blocked.
        const PE_OUTFEED_B = 0x40;
        /// Outfeed C photoeye blocked.
        const PE_OUTFEED_C = 0x80;
    }
}

bitflags! {
    /// Packed digital output bank (5 points).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OutputBits: u8 {
        const MOTOR    = 0x01;
        const DIVERTER = 0x02;
        const BUZZER   = 0x04;
        const GREEN    = 0x08;
        const RED      = 0x10;
    }
}

assert_eq_size!(InputBits, u8);
assert_eq_size!(OutputBits, u8);

// ─── Input Snapshot ─────────────────────────────────────────────────

/// Sampled digital inputs for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Start push-button pressed.
    pub start_button: bool,
    /// Stop push-button (NC): `true` = not pressed.
    pub stop_ok: bool,
    /// E-stop circuit (NC): `true` = healthy.
    pub estop_ok: bool,
    /// Mode selector: `false` = Auto, `true` = Manual.
    pub mode_manual: bool,
    pub pe_infeed: bool,
    pub pe_diverter: bool,
    pub pe_outfeed_b: bool,
    pub pe_outfeed_c: bool,
}

impl Default for InputSnapshot {
    /// Idle line: circuits healthy, buttons released, Auto, all photoeyes clear.
    fn default() -> Self {
        Self {
            start_button: false,
            stop_ok: true,
            estop_ok: true,
            mode_manual: false,
            pe_infeed: false,
            pe_diverter: false,
            pe_outfeed_b: false,
            pe_outfeed_c: false,
        }
    }
}

impl InputSnapshot {
    /// Unpack from the packed input bank.
    pub const fn from_bits(bits: InputBits) -> Self {
        Self {
            start_button: bits.contains(InputBits::START),
            stop_ok: bits.contains(InputBits::STOP_OK),
            estop_ok: bits.contains(InputBits::ESTOP_OK),
            mode_manual: bits.contains(InputBits::MODE_MANUAL),
            pe_infeed: bits.contains(InputBits::PE_INFEED),
            pe_diverter: bits.contains(InputBits::PE_DIVERTER),
            pe_outfeed_b: bits.contains(InputBits::PE_OUTFEED_B),
            pe_outfeed_c: bits.contains(InputBits::PE_OUTFEED_C),
        }
    }

    /// Pack into the input bank.
    pub fn to_bits(&self) -> InputBits {
        let mut bits = InputBits::empty();
        bits.set(InputBits::START, self.start_button);
        bits.set(InputBits::STOP_OK, self.stop_ok);
        bits.set(InputBits::ESTOP_OK, self.estop_ok);
        bits.set(InputBits::MODE_MANUAL, self.mode_manual);
        bits.set(InputBits::PE_INFEED, self.pe_infeed);
        bits.set(InputBits::PE_DIVERTER, self.pe_diverter);
        bits.set(InputBits::PE_OUTFEED_B, self.pe_outfeed_b);
        bits.set(InputBits::PE_OUTFEED_C, self.pe_outfeed_c);
        bits
    }

    /// Blocked state of one photoeye.
    #[inline]
    pub const fn photoeye(&self, pe: Photoeye) -> bool {
        match pe {
            Photoeye::Infeed => self.pe_infeed,
            Photoeye::Diverter => self.pe_diverter,
            Photoeye::OutfeedB => self.pe_outfeed_b,
            Photoeye::OutfeedC => self.pe_outfeed_c,
        }
    }

    /// All four photoeyes in priority order.
    #[inline]
    pub const fn photoeyes(&self) -> [bool; 4] {
        [
            self.pe_infeed,
            self.pe_diverter,
            self.pe_outfeed_b,
            self.pe_outfeed_c,
        ]
    }

    /// Returns true when no photoeye is blocked.
    #[inline]
    pub const fn all_clear(&self) -> bool {
        !self.pe_infeed && !self.pe_diverter && !self.pe_outfeed_b && !self.pe_outfeed_c
    }

    /// Builder helper: set one photoeye.
    #[must_use]
    pub const fn with_photoeye(mut self, pe: Photoeye, blocked: bool) -> Self {
        match pe {
            Photoeye::Infeed => self.pe_infeed = blocked,
            Photoeye::Diverter => self.pe_diverter = blocked,
            Photoeye::OutfeedB => self.pe_outfeed_b = blocked,
            Photoeye::OutfeedC => self.pe_outfeed_c = blocked,
        }
        self
    }
}

// ─── Output Command ─────────────────────────────────────────────────

/// Commanded digital outputs for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OutputCommand {
    /// Belt motor contactor.
    pub motor: bool,
    /// Diverter actuator: `true` = extended (reject route).
    pub diverter: bool,
    pub buzzer: bool,
    pub green: bool,
    pub red: bool,
}

impl OutputCommand {
    /// All outputs de-energized.
    pub const OFF: Self = Self {
        motor: false,
        diverter: false,
        buzzer: false,
        green: false,
        red: false,
    };

    /// Pack into the output bank.
    pub fn to_bits(&self) -> OutputBits {
        let mut bits = OutputBits::empty();
        bits.set(OutputBits::MOTOR, self.motor);
        bits.set(OutputBits::DIVERTER, self.diverter);
        bits.set(OutputBits::BUZZER, self.buzzer);
        bits.set(OutputBits::GREEN, self.green);
        bits.set(OutputBits::RED, self.red);
        bits
    }

    /// Unpack from the output bank.
    pub const fn from_bits(bits: OutputBits) -> Self {
        Self {
            motor: bits.contains(OutputBits::MOTOR),
            diverter: bits.contains(OutputBits::DIVERTER),
            buzzer: bits.contains(OutputBits::BUZZER),
            green: bits.contains(OutputBits::GREEN),
            red: bits.contains(OutputBits::RED),
        }
    }
}
