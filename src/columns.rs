//! Registry of known column codes.
//!
//! A data module describes its record layout as a sequence of small integer
//! codes. Most codes name one scalar field ([`SCALAR_COLUMNS`]); a few name a
//! flag packed into the shared `flags` byte ([`FLAG_COLUMNS`]). The two code
//! sets are disjoint.
//!
//! Per-cell channels of multi-cell stacks (`<E1>/V`, `|E2|/V`, ...) are
//! ordinary scalar codes. Only the stack-level channels in
//! [`STACK_COLUMNS`] depend on stack mode, which is switched on when one of
//! [`STACK_MODE_MARKERS`] appears in the code sequence, see
//! [`ColumnRegistry::for_codes`].

use crate::types::{FlagType, ScalarType};

/// What a column code stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A field of its own in the record.
    Scalar {
        name: &'static str,
        scalar_type: ScalarType,
    },
    /// Bits within the shared flags byte.
    Flag {
        name: &'static str,
        mask: u8,
        flag_type: FlagType,
    },
}

/// Codes that name one scalar field, sorted by code.
///
/// Some names appear under several codes (e.g. `<I>/mA`, `step time/s`);
/// different instrument firmware uses different codes for the same quantity.
pub static SCALAR_COLUMNS: &[(u16, &str, ScalarType)] = &[
    (4, "time/s", ScalarType::F64),
    (5, "control/V/mA", ScalarType::F32),
    (6, "Ewe/V", ScalarType::F32),
    (7, "dq/mA.h", ScalarType::F64),
    (8, "I/mA", ScalarType::F32),
    (9, "Ece/V", ScalarType::F32),
    (11, "<I>/mA", ScalarType::F64),
    (13, "(Q-Qo)/mA.h", ScalarType::F64),
    (16, "Analog IN 1/V", ScalarType::F32),
    (19, "control/V", ScalarType::F32),
    (20, "control/mA", ScalarType::F32),
    (23, "dQ/mA.h", ScalarType::F64),
    (24, "cycle number", ScalarType::F64),
    (26, "Rapp/Ohm", ScalarType::F32),
    (27, "Ewe-Ece/V", ScalarType::F32),
    (32, "freq/Hz", ScalarType::F32),
    (33, "|Ewe|/V", ScalarType::F32),
    (34, "|I|/A", ScalarType::F32),
    (35, "Phase(Z)/deg", ScalarType::F32),
    (36, "|Z|/Ohm", ScalarType::F32),
    (37, "Re(Z)/Ohm", ScalarType::F32),
    (38, "-Im(Z)/Ohm", ScalarType::F32),
    (39, "I Range", ScalarType::U16),
    (50, "E0/V", ScalarType::F32),
    (69, "R/Ohm", ScalarType::F32),
    (70, "P/W", ScalarType::F32),
    (73, "rotation rate/rpm", ScalarType::F32),
    (74, "|Energy|/W.h", ScalarType::F64),
    (75, "Analog OUT/V", ScalarType::F32),
    (76, "<I>/mA", ScalarType::F32),
    (77, "<Ewe>/V", ScalarType::F32),
    (78, "Cs-2/µF-2", ScalarType::F32),
    (96, "|Ece|/V", ScalarType::F32),
    (98, "Phase(Zce)/deg", ScalarType::F32),
    (99, "|Zce|/Ohm", ScalarType::F32),
    (100, "Re(Zce)/Ohm", ScalarType::F32),
    (101, "-Im(Zce)/Ohm", ScalarType::F32),
    (123, "Energy charge/W.h", ScalarType::F64),
    (124, "Energy discharge/W.h", ScalarType::F64),
    (125, "Capacitance charge/µF", ScalarType::F64),
    (126, "Capacitance discharge/µF", ScalarType::F64),
    (131, "Ns", ScalarType::U16),
    (168, "Rcmp/Ohm", ScalarType::F32),
    (169, "Cs/µF", ScalarType::F32),
    (172, "Cp/µF", ScalarType::F32),
    (173, "Cp-2/µF-2", ScalarType::F32),
    (174, "<Ewe>/V", ScalarType::F32),
    (178, "(Q-Qo)/C", ScalarType::F32),
    (179, "dQ/C", ScalarType::F32),
    (182, "step time/s", ScalarType::F64),
    (211, "Q charge/discharge/mA.h", ScalarType::F64),
    (212, "half cycle", ScalarType::U32),
    (213, "z cycle", ScalarType::U32),
    (217, "THD Ewe/%", ScalarType::F32),
    (218, "THD I/%", ScalarType::F32),
    (220, "NSD Ewe/%", ScalarType::F32),
    (221, "NSD I/%", ScalarType::F32),
    (223, "NSR Ewe/%", ScalarType::F32),
    (224, "NSR I/%", ScalarType::F32),
    (230, "|Ewe h2|/V", ScalarType::F32),
    (231, "|Ewe h3|/V", ScalarType::F32),
    (232, "|Ewe h4|/V", ScalarType::F32),
    (233, "|Ewe h5|/V", ScalarType::F32),
    (234, "|Ewe h6|/V", ScalarType::F32),
    (235, "|Ewe h7|/V", ScalarType::F32),
    (236, "|I h2|/A", ScalarType::F32),
    (237, "|I h3|/A", ScalarType::F32),
    (238, "|I h4|/A", ScalarType::F32),
    (239, "|I h5|/A", ScalarType::F32),
    (240, "|I h6|/A", ScalarType::F32),
    (241, "|I h7|/A", ScalarType::F32),
    (242, "|E2|/V", ScalarType::F32),
    (243, "|E3|/V", ScalarType::F32),
    (244, "|E4|/V", ScalarType::F32),
    (245, "|E5|/V", ScalarType::F32),
    (246, "|E6|/V", ScalarType::F32),
    (247, "|E7|/V", ScalarType::F32),
    (248, "|E8|/V", ScalarType::F32),
    (271, "Phase(Z1) / deg", ScalarType::F32),
    (272, "Phase(Z2) / deg", ScalarType::F32),
    (273, "Phase(Z3) / deg", ScalarType::F32),
    (274, "Phase(Z4) / deg", ScalarType::F32),
    (275, "Phase(Z5) / deg", ScalarType::F32),
    (276, "Phase(Z6) / deg", ScalarType::F32),
    (277, "Phase(Z7) / deg", ScalarType::F32),
    (278, "Phase(Z8) / deg", ScalarType::F32),
    (301, "|Z1|/Ohm", ScalarType::F32),
    (302, "|Z2|/Ohm", ScalarType::F32),
    (303, "|Z3|/Ohm", ScalarType::F32),
    (304, "|Z4|/Ohm", ScalarType::F32),
    (305, "|Z5|/Ohm", ScalarType::F32),
    (306, "|Z6|/Ohm", ScalarType::F32),
    (307, "|Z7|/Ohm", ScalarType::F32),
    (308, "|Z8|/Ohm", ScalarType::F32),
    (331, "Re(Z1)/Ohm", ScalarType::F32),
    (332, "Re(Z2)/Ohm", ScalarType::F32),
    (333, "Re(Z3)/Ohm", ScalarType::F32),
    (334, "Re(Z4)/Ohm", ScalarType::F32),
    (335, "Re(Z5)/Ohm", ScalarType::F32),
    (336, "Re(Z6)/Ohm", ScalarType::F32),
    (337, "Re(Z7)/Ohm", ScalarType::F32),
    (338, "Re(Z8)/Ohm", ScalarType::F32),
    (361, "-Im(Z1)/Ohm", ScalarType::F32),
    (362, "-Im(Z2)/Ohm", ScalarType::F32),
    (363, "-Im(Z3)/Ohm", ScalarType::F32),
    (364, "-Im(Z4)/Ohm", ScalarType::F32),
    (365, "-Im(Z5)/Ohm", ScalarType::F32),
    (366, "-Im(Z6)/Ohm", ScalarType::F32),
    (367, "-Im(Z7)/Ohm", ScalarType::F32),
    (368, "-Im(Z8)/Ohm", ScalarType::F32),
    (391, "<E1>/V", ScalarType::F32),
    (392, "<E2>/V", ScalarType::F32),
    (393, "<E3>/V", ScalarType::F32),
    (394, "<E4>/V", ScalarType::F32),
    (395, "<E5>/V", ScalarType::F32),
    (396, "<E6>/V", ScalarType::F32),
    (397, "<E7>/V", ScalarType::F32),
    (398, "<E8>/V", ScalarType::F32),
    (422, "Phase(Zstack)/deg", ScalarType::F32),
    (423, "|Zstack|/Ohm", ScalarType::F32),
    (424, "Re(Zstack)/Ohm", ScalarType::F32),
    (425, "-Im(Zstack)/Ohm", ScalarType::F32),
    (430, "Phase(Zwe-ce)/deg", ScalarType::F32),
    (431, "|Zwe-ce|/Ohm", ScalarType::F32),
    (432, "Re(Zwe-ce)/Ohm", ScalarType::F32),
    (433, "-Im(Zwe-ce)/Ohm", ScalarType::F32),
    (434, "(Q-Qo)/C", ScalarType::F32),
    (435, "dQ/C", ScalarType::F32),
    (438, "step time/s", ScalarType::F64),
    (441, "<Ecv>/V", ScalarType::F32),
    (462, "Temperature/°C", ScalarType::F32),
    (467, "Q charge/discharge/mA.h", ScalarType::F64),
    (468, "half cycle", ScalarType::U32),
    (469, "z cycle", ScalarType::U32),
    (471, "<Ece>/V", ScalarType::F32),
    (473, "THD Ewe/%", ScalarType::F32),
    (474, "THD I/%", ScalarType::F32),
    (475, "THD Ece/%", ScalarType::F32),
    (476, "NSD Ewe/%", ScalarType::F32),
    (477, "NSD I/%", ScalarType::F32),
    (478, "NSD Ece/%", ScalarType::F32),
    (479, "NSR Ewe/%", ScalarType::F32),
    (480, "NSR I/%", ScalarType::F32),
    (481, "NSR Ece/%", ScalarType::F32),
    (486, "|Ewe h2|/V", ScalarType::F32),
    (487, "|Ewe h3|/V", ScalarType::F32),
    (488, "|Ewe h4|/V", ScalarType::F32),
    (489, "|Ewe h5|/V", ScalarType::F32),
    (490, "|Ewe h6|/V", ScalarType::F32),
    (491, "|Ewe h7|/V", ScalarType::F32),
    (492, "|I h2|/A", ScalarType::F32),
    (493, "|I h3|/A", ScalarType::F32),
    (494, "|I h4|/A", ScalarType::F32),
    (495, "|I h5|/A", ScalarType::F32),
    (496, "|I h6|/A", ScalarType::F32),
    (497, "|I h7|/A", ScalarType::F32),
    (498, "|Ece h2|/V", ScalarType::F32),
    (499, "|Ece h3|/V", ScalarType::F32),
    (500, "|Ece h4|/V", ScalarType::F32),
    (501, "|Ece h5|/V", ScalarType::F32),
    (502, "|Ece h6|/V", ScalarType::F32),
    (503, "|Ece h7|/V", ScalarType::F32),
    (505, "Rdc/Ohm", ScalarType::F32),
    (509, "Acir/Dcir Control", ScalarType::U8),
];

/// Flag codes, all packed into one byte: `(code, name, mask, type)`.
///
/// Bit 0x40 is not used by any known code.
pub static FLAG_COLUMNS: &[(u16, &str, u8, FlagType)] = &[
    (1, "mode", 0x03, FlagType::U8),
    (2, "ox/red", 0x04, FlagType::Bool),
    (3, "error", 0x08, FlagType::Bool),
    (21, "control changes", 0x10, FlagType::Bool),
    (31, "Ns changes", 0x20, FlagType::Bool),
    (65, "counter inc.", 0x80, FlagType::Bool),
];

/// Codes whose presence switches the registry into stack mode.
pub const STACK_MODE_MARKERS: [u16; 2] = [163, 426];

/// Stack-level channels, only valid in stack mode. Sorted by code.
pub static STACK_COLUMNS: &[(u16, &str, ScalarType)] = &[
    (163, "|Estack|/V", ScalarType::F32),
    (426, "<Estack>/V", ScalarType::F32),
];

fn find_scalar(table: &'static [(u16, &'static str, ScalarType)], code: u16) -> Option<ColumnKind> {
    table
        .binary_search_by_key(&code, |&(c, _, _)| c)
        .ok()
        .map(|i| ColumnKind::Scalar {
            name: table[i].1,
            scalar_type: table[i].2,
        })
}

fn find_flag(code: u16) -> Option<ColumnKind> {
    FLAG_COLUMNS
        .iter()
        .find(|&&(c, _, _, _)| c == code)
        .map(|&(_, name, mask, flag_type)| ColumnKind::Flag {
            name,
            mask,
            flag_type,
        })
}

/// Lookup table for one decode: the base tables, optionally composed with
/// the stack-mode extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnRegistry {
    stack_mode: bool,
}

impl ColumnRegistry {
    /// Registry with only the base tables.
    pub const fn base() -> Self {
        Self { stack_mode: false }
    }

    /// Registry with the stack-mode extension enabled.
    pub const fn stack() -> Self {
        Self { stack_mode: true }
    }

    /// Pick the registry for a whole code sequence.
    ///
    /// Stack mode applies to every code of the sequence as soon as any
    /// marker is present, wherever it appears.
    pub fn for_codes(codes: &[u16]) -> Self {
        if codes.iter().any(|c| STACK_MODE_MARKERS.contains(c)) {
            Self::stack()
        } else {
            Self::base()
        }
    }

    pub fn is_stack_mode(&self) -> bool {
        self.stack_mode
    }

    /// Resolve a column code.
    pub fn lookup(&self, code: u16) -> Option<ColumnKind> {
        let stacked = if self.stack_mode {
            find_scalar(STACK_COLUMNS, code)
        } else {
            None
        };
        stacked
            .or_else(|| find_flag(code))
            .or_else(|| find_scalar(SCALAR_COLUMNS, code))
    }
}
