use std::io::{self, Write};

use crate::builder::QR;
use crate::common::metadata::Color;

// ASCII renderer
//------------------------------------------------------------------------------

// Half-block glyphs indexed by (top dark) + (bottom dark << 1)
static GLYPHS: [&str; 4] = ["█", "▄", "▀", " "];
static GLYPHS_INVERTED: [&str; 4] = [" ", "▄", "▀", "█"];

// Packs two matrix rows into each output line. TTY mode forces the
// inverted palette and wraps each line in 256-color escapes.
pub(crate) fn write_ascii<W: Write>(
    qr: &QR,
    quiet_zone: usize,
    tty: bool,
    invert: bool,
    out: &mut W,
) -> io::Result<()> {
    let invert = invert || tty;
    let glyphs = if invert { &GLYPHS_INVERTED } else { &GLYPHS };

    let w = qr.width() as i32;
    let border = quiet_zone as i32;

    let module = |r: i32, c: i32| -> usize {
        if invert && border > 0 && (r >= w + border || c >= w + border) {
            return 1;
        }
        if r < 0 || c < 0 || r >= w || c >= w {
            return 0;
        }
        matches!(*qr.get(r as i16, c as i16), Color::Dark) as usize
    };

    let mut r = -border;
    while r < w + border {
        if tty {
            if !invert || r < w + border - 1 {
                write!(out, "\x1b[48;5;232m")?;
            }
            write!(out, "\x1b[38;5;255m")?;
        }
        for c in -border..w + border {
            let pos = module(r, c) + (module(r + 1, c) << 1);
            write!(out, "{}", glyphs[pos])?;
        }
        if tty {
            write!(out, "\x1b[0m")?;
        }
        writeln!(out)?;
        r += 2;
    }

    Ok(())
}

#[cfg(test)]
mod render_tests {
    use crate::builder::QRCode;

    fn lines(quiet_zone: usize, tty: bool, invert: bool) -> Vec<String> {
        let mut qr = QRCode::new();
        qr.set_quiet_zone(quiet_zone);
        qr.set_version(1).unwrap();
        qr.add_segment(b"RENDER", 0).unwrap();
        let mut out = Vec::new();
        qr.print_ascii(&mut out, tty, invert).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_owned).collect()
    }

    #[test]
    fn test_dimensions() {
        // Two matrix rows per line, rounded up over the bordered height
        let lines = lines(4, false, false);
        assert_eq!(lines.len(), (21usize + 8).div_ceil(2));
        assert!(lines.iter().all(|l| l.chars().count() == 21 + 8));
    }

    #[test]
    fn test_border_renders_light() {
        let lines = lines(2, false, false);
        // A light pair of modules renders as a full block
        assert!(lines[0].chars().all(|c| c == '█'));
    }

    #[test]
    fn test_invert_flips_palette() {
        let plain = lines(2, false, false);
        let inverted = lines(2, false, true);
        assert!(inverted[0].chars().all(|c| c == ' '));
        assert_eq!(plain.len(), inverted.len());
    }

    #[test]
    fn test_tty_escapes() {
        let lines = lines(2, true, false);
        assert!(lines[0].starts_with("\x1b[48;5;232m\x1b[38;5;255m"));
        assert!(lines[0].ends_with("\x1b[0m"));
    }
}
