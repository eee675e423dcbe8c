use std::ops::Deref;

use itertools::Itertools;

use crate::builder::QR;
use crate::common::error::{QRError, QRResult};
use crate::common::metadata::Color;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        if pattern < 8 {
            Ok(Self(pattern))
        } else {
            Err(QRError::InvalidMaskPattern)
        }
    }

    pub(crate) const fn new_unchecked(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// The eight predicates; true means flip the module at (row, col)
mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        (((r * c) % 3 + (r + c)) & 1) == 0
    }
}

impl MaskPattern {
    pub(crate) fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid pattern"),
        }
    }
}

// Mask selection
//------------------------------------------------------------------------------

// Scores all eight candidates on a fully mapped matrix and keeps the one
// with the lowest penalty; ties resolve to the lowest pattern index
pub(crate) fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = (0..8)
        .min_by_key(|&m| {
            let mut trial = qr.clone();
            trial.apply_mask(MaskPattern(m));
            compute_total_penalty(&trial)
        })
        .expect("Should return at least 1 mask");
    let best_mask = MaskPattern(best_mask);
    qr.apply_mask(best_mask);
    best_mask
}

pub(crate) fn compute_total_penalty(qr: &QR) -> u32 {
    let run_pen = compute_run_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen_h = compute_finder_pattern_penalty(qr, true);
    let fp_pen_v = compute_finder_pattern_penalty(qr, false);
    let bal_pen = compute_balance_penalty(qr);
    run_pen + blk_pen + fp_pen_h + fp_pen_v + bal_pen
}

// Rule 1: each run of 5 or more equal modules costs its length minus 2
fn compute_run_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let mut pen = 0;
    for i in 0..w {
        pen += line_run_penalty((0..w).map(|j| *qr.get(i, j)));
        pen += line_run_penalty((0..w).map(|j| *qr.get(j, i)));
    }
    pen
}

fn line_run_penalty(line: impl Iterator<Item = Color>) -> u32 {
    let mut pen = 0;
    for (_, run) in &line.chunk_by(|&clr| clr) {
        let len = run.count();
        if len >= 5 {
            pen += len as u32 - 2;
        }
    }
    pen
}

// Rule 2: every 2x2 block of identical modules costs 3, overlaps included
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// Rule 3: a finder-like 1:1:3:1:1 run with a 4-module light flank costs 40
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    static PATTERN: [Color; 11] = [
        Color::Dark,
        Color::Light,
        Color::Dark,
        Color::Dark,
        Color::Dark,
        Color::Light,
        Color::Dark,
        Color::Light,
        Color::Light,
        Color::Light,
        Color::Light,
    ];

    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        for j in 0..=w - 11 {
            let at = |k: i16| if is_hor { *qr.get(i, j + k) } else { *qr.get(j + k, i) };
            let forward = (0..11).all(|k| at(k) == PATTERN[k as usize]);
            let backward = (0..11).all(|k| at(k) == PATTERN[10 - k as usize]);
            if forward || backward {
                pen += 40;
            }
        }
    }
    pen
}

// Rule 4: 10 points for every 5% the dark share deviates from 50%
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark_cnt = qr.count_dark_modules();
    let w = qr.width();
    let percent = dark_cnt * 100 / (w * w);
    (percent.abs_diff(50) / 5) as u32 * 10
}
