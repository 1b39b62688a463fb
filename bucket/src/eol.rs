//! Line terminator recognition.
//!
//! An [`EolSet`] says which terminators a caller accepts; an [`Eol`] reports
//! which one ended the returned data. [`scan`] is the single place that decides
//! what counts as a terminator, shared by the default line read and by kinds
//! that scan their own buffers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of acceptable line terminators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EolSet(u8);

impl EolSet {
    /// No terminator is acceptable; line reads behave like plain reads.
    pub const NONE: EolSet = EolSet(0);
    /// `\n`.
    pub const LF: EolSet = EolSet(0x01);
    /// A lone `\r`.
    pub const CR: EolSet = EolSet(0x02);
    /// `\r\n`.
    pub const CRLF: EolSet = EolSet(0x04);
    /// Any of `\n`, `\r`, `\r\n`.
    pub const ANY: EolSet = EolSet(0x07);

    /// Returns true if every terminator in `other` is in `self`.
    pub const fn contains(self, other: EolSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no terminator is acceptable.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    fn has(self, other: EolSet) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EolSet {
    type Output = EolSet;

    fn bitor(self, rhs: EolSet) -> EolSet {
        EolSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for EolSet {
    fn bitor_assign(&mut self, rhs: EolSet) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "EolSet(NONE)");
        }
        let names: Vec<&str> = [(EolSet::LF, "LF"), (EolSet::CR, "CR"), (EolSet::CRLF, "CRLF")]
            .iter()
            .filter(|(set, _)| self.has(*set))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "EolSet({})", names.join("|"))
    }
}

/// The terminator that ended a line read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Eol {
    /// No terminator in the returned data.
    #[default]
    None,
    /// Ended by `\n`.
    Lf,
    /// Ended by a lone `\r`.
    Cr,
    /// Ended by `\r\n`.
    CrLf,
    /// Ended by `\r` at the end of the available data while `\r\n` is
    /// acceptable. The next byte decides between `CrLf` and a lone `\r`.
    CrLfSplit,
}

impl Eol {
    /// Returns the number of terminator bytes at the end of the line.
    pub fn terminator_len(self) -> usize {
        match self {
            Eol::None => 0,
            Eol::Lf | Eol::Cr | Eol::CrLfSplit => 1,
            Eol::CrLf => 2,
        }
    }

    /// Returns true unless this is [`Eol::None`].
    pub fn is_found(self) -> bool {
        self != Eol::None
    }

    /// Returns true for a complete terminator, excluding [`Eol::CrLfSplit`].
    pub fn is_complete(self) -> bool {
        matches!(self, Eol::Lf | Eol::Cr | Eol::CrLf)
    }
}

/// Result of scanning a buffer for the first acceptable terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScan {
    /// Bytes up to and including the terminator, or the whole buffer.
    pub len: usize,
    /// The terminator found, [`Eol::None`] if there is none.
    pub found: Eol,
}

/// Finds the first terminator in `buf` acceptable under `acceptable`.
///
/// `at_end` tells whether `buf` holds every remaining byte of the stream. It
/// only matters for a trailing `\r`: with more data possibly following and
/// `\r\n` acceptable, the line ends in [`Eol::CrLfSplit`].
pub fn scan(acceptable: EolSet, buf: &[u8], at_end: bool) -> LineScan {
    let whole = LineScan {
        len: buf.len(),
        found: Eol::None,
    };
    if acceptable.is_empty() {
        return whole;
    }

    let want_lf = acceptable.has(EolSet::LF);
    let want_cr = acceptable.has(EolSet::CR);
    let want_crlf = acceptable.has(EolSet::CRLF);

    for (i, &b) in buf.iter().enumerate() {
        match b {
            b'\n' if want_lf => {
                return LineScan {
                    len: i + 1,
                    found: Eol::Lf,
                };
            }
            b'\r' if want_cr || want_crlf => match buf.get(i + 1) {
                Some(b'\n') if want_crlf => {
                    return LineScan {
                        len: i + 2,
                        found: Eol::CrLf,
                    };
                }
                Some(_) if want_cr => {
                    return LineScan {
                        len: i + 1,
                        found: Eol::Cr,
                    };
                }
                Some(_) => {}
                None if want_crlf && !at_end => {
                    return LineScan {
                        len: i + 1,
                        found: Eol::CrLfSplit,
                    };
                }
                None if want_cr => {
                    return LineScan {
                        len: i + 1,
                        found: Eol::Cr,
                    };
                }
                None => {}
            },
            _ => {}
        }
    }
    whole
}

/// Returns how many bytes past the visible data a line read requests when no
/// terminator is visible, so a terminator straddling the boundary is caught.
pub(crate) fn lookahead(acceptable: EolSet) -> usize {
    if acceptable == EolSet::CRLF { 2 } else { 1 }
}
