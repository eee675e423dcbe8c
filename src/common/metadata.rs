use std::ops::{Deref, Not};
use std::sync::OnceLock;

use crate::common::codec::Mode;
use crate::common::error::{QRError, QRResult};
use crate::common::mask::MaskPattern;

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub fn new(version: usize) -> QRResult<Self> {
        if (1..=40).contains(&version) {
            Ok(Self(version))
        } else {
            Err(QRError::InvalidVersion)
        }
    }

    pub(crate) const fn new_unchecked(version: usize) -> Self {
        debug_assert!(1 <= version && version <= 40, "Invalid version");
        Self(version)
    }

    pub const fn width(self) -> usize {
        self.0 * 4 + 17
    }

    pub fn alignment_pattern(self) -> &'static [i16] {
        ALIGNMENT_PATTERN_POSITIONS[self.0 - 1]
    }

    pub(crate) fn info(self) -> u32 {
        debug_assert!(self.0 >= 7, "No version info below version 7");
        bch_type_number(self.0 as u32)
    }

    pub const fn mode_bits(self) -> usize {
        4
    }

    // Character count indicator width, bucketed by version
    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        match self.0 {
            1..=9 => match mode {
                Mode::Numeric => 10,
                Mode::Alphanumeric => 9,
                Mode::Byte => 8,
            },
            10..=26 => match mode {
                Mode::Numeric => 12,
                Mode::Alphanumeric => 11,
                Mode::Byte => 16,
            },
            27..=40 => match mode {
                Mode::Numeric => 14,
                Mode::Alphanumeric => 13,
                Mode::Byte => 16,
            },
            _ => unreachable!("Invalid version"),
        }
    }

    pub(crate) fn char_cnt_bucket(self) -> usize {
        match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        }
    }

    pub fn rs_blocks(self, ec_level: ECLevel) -> Vec<RSBlock> {
        let row = RS_BLOCK_TABLE[(self.0 - 1) * 4 + ec_level as usize];
        let mut blocks = Vec::with_capacity(row.iter().map(|&(count, _, _)| count).sum());
        for &(count, total, data) in row {
            blocks.extend(std::iter::repeat(RSBlock { total, data }).take(count));
        }
        blocks
    }

    pub fn data_bit_capacity(self, ec_level: ECLevel) -> usize {
        bit_limits(ec_level)[self.0 - 1]
    }

    pub fn total_codewords(self, ec_level: ECLevel) -> usize {
        self.rs_blocks(ec_level).iter().map(|b| b.total).sum()
    }

    // Conservative byte capacity: worst case header is 4 mode bits
    // plus a 16-bit character count
    pub fn data_capacity(self, ec_level: ECLevel) -> usize {
        (self.data_bit_capacity(ec_level) >> 3).saturating_sub(3)
    }

    pub(crate) fn remainder_bits(self) -> usize {
        match self.0 {
            2..=6 => 7,
            14..=20 | 28..=34 => 3,
            21..=27 => 4,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod version_tests {
    use super::{ECLevel, Version};
    use crate::common::codec::Mode;

    #[test]
    fn test_new_bounds() {
        assert!(Version::new(0).is_err());
        assert!(Version::new(41).is_err());
        assert!(Version::new(1).is_ok());
        assert!(Version::new(40).is_ok());
    }

    #[test]
    fn test_width() {
        assert_eq!(Version::new_unchecked(1).width(), 21);
        assert_eq!(Version::new_unchecked(7).width(), 45);
        assert_eq!(Version::new_unchecked(40).width(), 177);
    }

    #[test]
    fn test_char_cnt_bits() {
        assert_eq!(Version::new_unchecked(1).char_cnt_bits(Mode::Numeric), 10);
        assert_eq!(Version::new_unchecked(9).char_cnt_bits(Mode::Numeric), 10);
        assert_eq!(Version::new_unchecked(10).char_cnt_bits(Mode::Numeric), 12);
        assert_eq!(Version::new_unchecked(26).char_cnt_bits(Mode::Numeric), 12);
        assert_eq!(Version::new_unchecked(27).char_cnt_bits(Mode::Numeric), 14);
        assert_eq!(Version::new_unchecked(40).char_cnt_bits(Mode::Numeric), 14);
        assert_eq!(Version::new_unchecked(1).char_cnt_bits(Mode::Alphanumeric), 9);
        assert_eq!(Version::new_unchecked(10).char_cnt_bits(Mode::Alphanumeric), 11);
        assert_eq!(Version::new_unchecked(27).char_cnt_bits(Mode::Alphanumeric), 13);
        assert_eq!(Version::new_unchecked(1).char_cnt_bits(Mode::Byte), 8);
        assert_eq!(Version::new_unchecked(10).char_cnt_bits(Mode::Byte), 16);
        assert_eq!(Version::new_unchecked(40).char_cnt_bits(Mode::Byte), 16);
    }

    #[test]
    fn test_rs_block_sums() {
        // Total codeword count depends on the version alone
        for v in 1..=40 {
            let ver = Version::new_unchecked(v);
            let expected = ver.total_codewords(ECLevel::L);
            for ecl in [ECLevel::M, ECLevel::Q, ECLevel::H] {
                let blocks = ver.rs_blocks(ecl);
                let total: usize = blocks.iter().map(|b| b.total).sum();
                let split: usize = blocks.iter().map(|b| b.data + b.ec_len()).sum();
                assert_eq!(total, expected, "version {v}");
                assert_eq!(total, split, "version {v}");
            }
        }
    }

    #[test]
    fn test_bit_capacity() {
        assert_eq!(Version::new_unchecked(1).data_bit_capacity(ECLevel::L), 152);
        assert_eq!(Version::new_unchecked(1).data_bit_capacity(ECLevel::H), 72);
        assert_eq!(Version::new_unchecked(11).data_bit_capacity(ECLevel::L), 2592);
        assert_eq!(Version::new_unchecked(40).data_bit_capacity(ECLevel::L), 23648);
        assert_eq!(Version::new_unchecked(40).data_bit_capacity(ECLevel::H), 10208);
    }

    #[test]
    fn test_remainder_bits() {
        assert_eq!(Version::new_unchecked(1).remainder_bits(), 0);
        assert_eq!(Version::new_unchecked(2).remainder_bits(), 7);
        assert_eq!(Version::new_unchecked(7).remainder_bits(), 0);
        assert_eq!(Version::new_unchecked(14).remainder_bits(), 3);
        assert_eq!(Version::new_unchecked(21).remainder_bits(), 4);
        assert_eq!(Version::new_unchecked(28).remainder_bits(), 3);
        assert_eq!(Version::new_unchecked(35).remainder_bits(), 0);
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    // On-wire representation in the format info word: L=01, M=00, Q=11, H=10
    pub(crate) fn format_bits(self) -> u32 {
        (self as u32) ^ 1
    }
}

// RS block descriptor
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RSBlock {
    pub total: usize,
    pub data: usize,
}

impl RSBlock {
    pub fn ec_len(&self) -> usize {
        self.total - self.data
    }
}

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Color {
    Light,
    Dark,
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

// Format & version info BCH
//------------------------------------------------------------------------------

pub(crate) const FORMAT_INFO_BIT_LEN: usize = 15;
pub(crate) const VERSION_INFO_BIT_LEN: usize = 18;

const G15: u32 = 0b000_0101_0011_0111;
const G18: u32 = 0b1_1111_0010_0101;
const G15_MASK: u32 = 0b101_0100_0001_0010;

fn bch_digit(mut data: u32) -> u32 {
    let mut digit = 0;
    while data != 0 {
        digit += 1;
        data >>= 1;
    }
    digit
}

pub(crate) fn bch_type_info(data: u32) -> u32 {
    debug_assert!(data < 32, "Format data exceeds 5 bits: {data}");
    let mut d = data << 10;
    while bch_digit(d) >= bch_digit(G15) {
        d ^= G15 << (bch_digit(d) - bch_digit(G15));
    }
    ((data << 10) | d) ^ G15_MASK
}

pub(crate) fn bch_type_number(data: u32) -> u32 {
    debug_assert!(data < 64, "Version data exceeds 6 bits: {data}");
    let mut d = data << 12;
    while bch_digit(d) >= bch_digit(G18) {
        d ^= G18 << (bch_digit(d) - bch_digit(G18));
    }
    (data << 12) | d
}

pub(crate) fn generate_format_info(ec_level: ECLevel, mask: MaskPattern) -> u32 {
    bch_type_info((ec_level.format_bits() << 3) | *mask as u32)
}

#[cfg(test)]
mod bch_tests {
    use super::{bch_type_info, bch_type_number, generate_format_info, ECLevel};
    use crate::common::mask::MaskPattern;

    #[test]
    fn test_bch_type_info() {
        assert_eq!(bch_type_info(0b00000), 0x5412);
        assert_eq!(bch_type_info(0b00001), 0x5125);
        assert_eq!(bch_type_info(0b01000), 0x77c4);
        assert_eq!(bch_type_info(0b10101), 0x0255);
        assert_eq!(bch_type_info(0b11111), 0x2bed);
    }

    #[test]
    fn test_bch_type_number() {
        assert_eq!(bch_type_number(7), 0x07c94);
        assert_eq!(bch_type_number(8), 0x085bc);
        assert_eq!(bch_type_number(21), 0x15683);
        assert_eq!(bch_type_number(40), 0x28c69);
    }

    #[test]
    fn test_bch_type_info_distance() {
        // BCH(15, 5) guarantees a minimum Hamming distance of 7
        for x in 0..32u32 {
            for y in 0..32u32 {
                if x == y {
                    continue;
                }
                let dist = (bch_type_info(x) ^ bch_type_info(y)).count_ones();
                assert!(dist >= 7, "d({x}, {y}) = {dist}");
            }
        }
    }

    #[test]
    fn test_format_info_ec_mapping() {
        // The encoded EC bits differ from the internal ordering: L=01, M=00, Q=11, H=10
        let mask = MaskPattern::new(0).unwrap();
        assert_eq!(generate_format_info(ECLevel::L, mask), bch_type_info(0b01000));
        assert_eq!(generate_format_info(ECLevel::M, mask), bch_type_info(0b00000));
        assert_eq!(generate_format_info(ECLevel::Q, mask), bch_type_info(0b11000));
        assert_eq!(generate_format_info(ECLevel::H, mask), bch_type_info(0b10000));
    }
}

// Precomputed data bit capacity per EC level and version
//------------------------------------------------------------------------------

static BIT_LIMITS: OnceLock<[[usize; 40]; 4]> = OnceLock::new();

pub(crate) fn bit_limits(ec_level: ECLevel) -> &'static [usize; 40] {
    let table = BIT_LIMITS.get_or_init(|| {
        let mut table = [[0; 40]; 4];
        for (e, row) in table.iter_mut().enumerate() {
            let ecl = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H][e];
            for (v, limit) in row.iter_mut().enumerate() {
                let ver = Version::new_unchecked(v + 1);
                *limit = ver.rs_blocks(ecl).iter().map(|b| b.data * 8).sum();
            }
        }
        table
    });
    &table[ec_level as usize]
}

// Info placement coordinates
//------------------------------------------------------------------------------

// Most significant bit first; negative coordinates wrap around the far edge

pub(crate) static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub(crate) static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

pub(crate) static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

pub(crate) static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

// Global constants
//------------------------------------------------------------------------------

static ALIGNMENT_PATTERN_POSITIONS: [&[i16]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

// Block layout per (version, EC level): (count, total codewords, data codewords)
static RS_BLOCK_TABLE: [&[(usize, usize, usize)]; 160] = [
    // Version 1
    &[(1, 26, 19)],
    &[(1, 26, 16)],
    &[(1, 26, 13)],
    &[(1, 26, 9)],
    // Version 2
    &[(1, 44, 34)],
    &[(1, 44, 28)],
    &[(1, 44, 22)],
    &[(1, 44, 16)],
    // Version 3
    &[(1, 70, 55)],
    &[(1, 70, 44)],
    &[(2, 35, 17)],
    &[(2, 35, 13)],
    // Version 4
    &[(1, 100, 80)],
    &[(2, 50, 32)],
    &[(2, 50, 24)],
    &[(4, 25, 9)],
    // Version 5
    &[(1, 134, 108)],
    &[(2, 67, 43)],
    &[(2, 33, 15), (2, 34, 16)],
    &[(2, 33, 11), (2, 34, 12)],
    // Version 6
    &[(2, 86, 68)],
    &[(4, 43, 27)],
    &[(4, 43, 19)],
    &[(4, 43, 15)],
    // Version 7
    &[(2, 98, 78)],
    &[(4, 49, 31)],
    &[(2, 32, 14), (4, 33, 15)],
    &[(4, 39, 13), (1, 40, 14)],
    // Version 8
    &[(2, 121, 97)],
    &[(2, 60, 38), (2, 61, 39)],
    &[(4, 40, 18), (2, 41, 19)],
    &[(4, 40, 14), (2, 41, 15)],
    // Version 9
    &[(2, 146, 116)],
    &[(3, 58, 36), (2, 59, 37)],
    &[(4, 36, 16), (4, 37, 17)],
    &[(4, 36, 12), (4, 37, 13)],
    // Version 10
    &[(2, 86, 68), (2, 87, 69)],
    &[(4, 69, 43), (1, 70, 44)],
    &[(6, 43, 19), (2, 44, 20)],
    &[(6, 43, 15), (2, 44, 16)],
    // Version 11
    &[(4, 101, 81)],
    &[(1, 80, 50), (4, 81, 51)],
    &[(4, 50, 22), (4, 51, 23)],
    &[(3, 36, 12), (8, 37, 13)],
    // Version 12
    &[(2, 116, 92), (2, 117, 93)],
    &[(6, 58, 36), (2, 59, 37)],
    &[(4, 46, 20), (6, 47, 21)],
    &[(7, 42, 14), (4, 43, 15)],
    // Version 13
    &[(4, 133, 107)],
    &[(8, 59, 37), (1, 60, 38)],
    &[(8, 44, 20), (4, 45, 21)],
    &[(12, 33, 11), (4, 34, 12)],
    // Version 14
    &[(3, 145, 115), (1, 146, 116)],
    &[(4, 64, 40), (5, 65, 41)],
    &[(11, 36, 16), (5, 37, 17)],
    &[(11, 36, 12), (5, 37, 13)],
    // Version 15
    &[(5, 109, 87), (1, 110, 88)],
    &[(5, 65, 41), (5, 66, 42)],
    &[(5, 54, 24), (7, 55, 25)],
    &[(11, 36, 12), (7, 37, 13)],
    // Version 16
    &[(5, 122, 98), (1, 123, 99)],
    &[(7, 73, 45), (3, 74, 46)],
    &[(15, 43, 19), (2, 44, 20)],
    &[(3, 45, 15), (13, 46, 16)],
    // Version 17
    &[(1, 135, 107), (5, 136, 108)],
    &[(10, 74, 46), (1, 75, 47)],
    &[(1, 50, 22), (15, 51, 23)],
    &[(2, 42, 14), (17, 43, 15)],
    // Version 18
    &[(5, 150, 120), (1, 151, 121)],
    &[(9, 69, 43), (4, 70, 44)],
    &[(17, 50, 22), (1, 51, 23)],
    &[(2, 42, 14), (19, 43, 15)],
    // Version 19
    &[(3, 141, 113), (4, 142, 114)],
    &[(3, 70, 44), (11, 71, 45)],
    &[(17, 47, 21), (4, 48, 22)],
    &[(9, 39, 13), (16, 40, 14)],
    // Version 20
    &[(3, 135, 107), (5, 136, 108)],
    &[(3, 67, 41), (13, 68, 42)],
    &[(15, 54, 24), (5, 55, 25)],
    &[(15, 43, 15), (10, 44, 16)],
    // Version 21
    &[(4, 144, 116), (4, 145, 117)],
    &[(17, 68, 42)],
    &[(17, 50, 22), (6, 51, 23)],
    &[(19, 46, 16), (6, 47, 17)],
    // Version 22
    &[(2, 139, 111), (7, 140, 112)],
    &[(17, 74, 46)],
    &[(7, 54, 24), (16, 55, 25)],
    &[(34, 37, 13)],
    // Version 23
    &[(4, 151, 121), (5, 152, 122)],
    &[(4, 75, 47), (14, 76, 48)],
    &[(11, 54, 24), (14, 55, 25)],
    &[(16, 45, 15), (14, 46, 16)],
    // Version 24
    &[(6, 147, 117), (4, 148, 118)],
    &[(6, 73, 45), (14, 74, 46)],
    &[(11, 54, 24), (16, 55, 25)],
    &[(30, 46, 16), (2, 47, 17)],
    // Version 25
    &[(8, 132, 106), (4, 133, 107)],
    &[(8, 75, 47), (13, 76, 48)],
    &[(7, 54, 24), (22, 55, 25)],
    &[(22, 45, 15), (13, 46, 16)],
    // Version 26
    &[(10, 142, 114), (2, 143, 115)],
    &[(19, 74, 46), (4, 75, 47)],
    &[(28, 50, 22), (6, 51, 23)],
    &[(33, 46, 16), (4, 47, 17)],
    // Version 27
    &[(8, 152, 122), (4, 153, 123)],
    &[(22, 73, 45), (3, 74, 46)],
    &[(8, 53, 23), (26, 54, 24)],
    &[(12, 45, 15), (28, 46, 16)],
    // Version 28
    &[(3, 147, 117), (10, 148, 118)],
    &[(3, 73, 45), (23, 74, 46)],
    &[(4, 54, 24), (31, 55, 25)],
    &[(11, 45, 15), (31, 46, 16)],
    // Version 29
    &[(7, 146, 116), (7, 147, 117)],
    &[(21, 73, 45), (7, 74, 46)],
    &[(1, 53, 23), (37, 54, 24)],
    &[(19, 45, 15), (26, 46, 16)],
    // Version 30
    &[(5, 145, 115), (10, 146, 116)],
    &[(19, 75, 47), (10, 76, 48)],
    &[(15, 54, 24), (25, 55, 25)],
    &[(23, 45, 15), (25, 46, 16)],
    // Version 31
    &[(13, 145, 115), (3, 146, 116)],
    &[(2, 74, 46), (29, 75, 47)],
    &[(42, 54, 24), (1, 55, 25)],
    &[(23, 45, 15), (28, 46, 16)],
    // Version 32
    &[(17, 145, 115)],
    &[(10, 74, 46), (23, 75, 47)],
    &[(10, 54, 24), (35, 55, 25)],
    &[(19, 45, 15), (35, 46, 16)],
    // Version 33
    &[(17, 145, 115), (1, 146, 116)],
    &[(14, 74, 46), (21, 75, 47)],
    &[(29, 54, 24), (19, 55, 25)],
    &[(11, 45, 15), (46, 46, 16)],
    // Version 34
    &[(13, 145, 115), (6, 146, 116)],
    &[(14, 74, 46), (23, 75, 47)],
    &[(44, 54, 24), (7, 55, 25)],
    &[(59, 46, 16), (1, 47, 17)],
    // Version 35
    &[(12, 151, 121), (7, 152, 122)],
    &[(12, 75, 47), (26, 76, 48)],
    &[(39, 54, 24), (14, 55, 25)],
    &[(22, 45, 15), (41, 46, 16)],
    // Version 36
    &[(6, 151, 121), (14, 152, 122)],
    &[(6, 75, 47), (34, 76, 48)],
    &[(46, 54, 24), (10, 55, 25)],
    &[(2, 45, 15), (64, 46, 16)],
    // Version 37
    &[(17, 152, 122), (4, 153, 123)],
    &[(29, 74, 46), (14, 75, 47)],
    &[(49, 54, 24), (10, 55, 25)],
    &[(24, 45, 15), (46, 46, 16)],
    // Version 38
    &[(4, 152, 122), (18, 153, 123)],
    &[(13, 74, 46), (32, 75, 47)],
    &[(48, 54, 24), (14, 55, 25)],
    &[(42, 45, 15), (32, 46, 16)],
    // Version 39
    &[(20, 147, 117), (4, 148, 118)],
    &[(40, 75, 47), (7, 76, 48)],
    &[(43, 54, 24), (22, 55, 25)],
    &[(10, 45, 15), (67, 46, 16)],
    // Version 40
    &[(19, 148, 118), (6, 149, 119)],
    &[(18, 75, 47), (31, 76, 48)],
    &[(34, 54, 24), (34, 55, 25)],
    &[(20, 45, 15), (61, 46, 16)],
];
