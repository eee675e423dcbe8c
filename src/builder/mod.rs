mod qr;

pub(crate) use qr::{Module, QR};

use std::io::Write;
use std::ops::Deref;

use crate::common::{
    codec::{self, optimal_data_chunks, optimal_mode, Mode, Segment},
    ec::{ecc, Polynomial},
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, RSBlock, Version},
};
use crate::render;

// QR symbol
//------------------------------------------------------------------------------

// A single-shot symbol: parameters and segments accumulate, `build`
// finalizes the matrix. Any parameter or segment change invalidates the
// cached build state, so a failed build can be retried after adjustment.
#[derive(Debug, Clone)]
pub struct QRCode {
    version: Option<Version>,
    ec_level: ECLevel,
    module_scale: u32,
    quiet_zone: usize,
    mask: Option<MaskPattern>,
    segments: Vec<Segment>,
    payload: Option<(Version, Vec<u8>)>,
    canvas: Option<QR>,
}

impl Default for QRCode {
    fn default() -> Self {
        Self::new()
    }
}

impl QRCode {
    pub fn new() -> Self {
        Self {
            version: None,
            ec_level: ECLevel::M,
            module_scale: 10,
            quiet_zone: 4,
            mask: None,
            segments: Vec::new(),
            payload: None,
            canvas: None,
        }
    }

    // Full constructor; `version` 0 means auto-fit, `mask` None means
    // penalty-scored selection
    pub fn with_options(
        version: usize,
        ec_level: ECLevel,
        module_scale: u32,
        quiet_zone: usize,
        mask: Option<u8>,
    ) -> QRResult<Self> {
        let mut qr = Self::new();
        qr.set_version(version)?
            .set_ec_level(ec_level)
            .set_module_scale(module_scale)?
            .set_quiet_zone(quiet_zone)
            .set_mask(mask)?;
        Ok(qr)
    }

    pub fn set_version(&mut self, version: usize) -> QRResult<&mut Self> {
        self.version = if version == 0 { None } else { Some(Version::new(version)?) };
        self.invalidate();
        Ok(self)
    }

    pub fn set_ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self.invalidate();
        self
    }

    pub fn set_module_scale(&mut self, module_scale: u32) -> QRResult<&mut Self> {
        if module_scale < 1 {
            return Err(QRError::InvalidModuleScale);
        }
        self.module_scale = module_scale;
        Ok(self)
    }

    pub fn set_quiet_zone(&mut self, quiet_zone: usize) -> &mut Self {
        self.quiet_zone = quiet_zone;
        self
    }

    pub fn set_mask(&mut self, mask: Option<u8>) -> QRResult<&mut Self> {
        self.mask = match mask {
            Some(m) => Some(MaskPattern::new(m)?),
            None => None,
        };
        self.canvas = None;
        Ok(self)
    }

    // Resolved version: the built symbol's if available, else the
    // configured one
    pub fn version(&self) -> Option<Version> {
        self.canvas.as_ref().map(|qr| qr.version()).or(self.version)
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask_pattern(&self) -> Option<u8> {
        self.canvas
            .as_ref()
            .and_then(|qr| qr.mask_pattern())
            .or(self.mask)
            .map(|m| *m)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn metadata(&self) -> String {
        match self.version() {
            Some(v) => format!(
                "{{ Version: {:?}, Ec level: {:?}, Scale: {}, Quiet zone: {} }}",
                *v, self.ec_level, self.module_scale, self.quiet_zone
            ),
            None => format!(
                "{{ Version: None, Ec level: {:?}, Scale: {}, Quiet zone: {} }}",
                self.ec_level, self.module_scale, self.quiet_zone
            ),
        }
    }

    // Appends raw bytes. With `optimize` 0 the whole input becomes one
    // segment in its optimal mode; a positive value runs the chunker
    // with that minimum run length.
    pub fn add_segment(&mut self, data: &[u8], optimize: usize) -> QRResult<&mut Self> {
        if optimize > 0 {
            self.segments.extend(optimal_data_chunks(data, optimize));
        } else {
            self.segments.push(Segment::new(optimal_mode(data), data.to_vec())?);
        }
        self.invalidate();
        Ok(self)
    }

    // Appends an already-typed segment; the payload must be
    // representable in the requested mode
    pub fn add_typed_segment(&mut self, mode: Mode, data: &[u8]) -> QRResult<&mut Self> {
        if mode < optimal_mode(data) {
            return Err(QRError::InvalidChar);
        }
        self.segments.push(Segment::new(mode, data.to_vec())?);
        self.invalidate();
        Ok(self)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.payload = None;
        self.canvas = None;
    }
}


// Build
//------------------------------------------------------------------------------

impl QRCode {
    // Transactional: nothing is stored on the symbol unless the whole
    // build succeeds
    pub fn build(&mut self, fit: bool) -> QRResult<()> {
        if self.segments.is_empty() {
            return Err(QRError::EmptyData);
        }

        let version = match (self.version, fit) {
            (Some(v), false) => v,
            (Some(v), true) => codec::find_best_version(&self.segments, self.ec_level, v)?,
            (None, _) => {
                codec::find_best_version(&self.segments, self.ec_level, Version::new_unchecked(1))?
            }
        };

        let payload = match &self.payload {
            Some((v, p)) if *v == version => p.clone(),
            _ => Self::assemble_payload(&self.segments, self.ec_level, version)?,
        };

        let mut qr = QR::with_function_patterns(version, self.ec_level);
        qr.draw_encoding_region(&payload);
        match self.mask {
            Some(m) => qr.apply_mask(m),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        self.payload = Some((version, payload));
        self.canvas = Some(qr);
        Ok(())
    }

    // Data codewords with terminator and padding, split across RS
    // blocks, followed by the interleaved EC codewords
    fn assemble_payload(
        segments: &[Segment],
        ec_level: ECLevel,
        version: Version,
    ) -> QRResult<Vec<u8>> {
        let encoded = codec::encode_with_version(segments, ec_level, version)?;
        let blocks = version.rs_blocks(ec_level);
        let data_blocks = Self::blockify(encoded.data(), &blocks);

        let generator = Polynomial::generator(blocks[0].ec_len());
        let ecc_blocks: Vec<Vec<u8>> = data_blocks.iter().map(|b| ecc(b, &generator)).collect();

        let mut payload = Vec::with_capacity(version.total_codewords(ec_level));
        payload.extend(Self::interleave(&data_blocks));
        payload.extend(Self::interleave(&ecc_blocks));
        Ok(payload)
    }

    pub(crate) fn blockify<'a>(data: &'a [u8], blocks: &[RSBlock]) -> Vec<&'a [u8]> {
        debug_assert_eq!(
            data.len(),
            blocks.iter().map(|b| b.data).sum::<usize>(),
            "Data length does not match the block layout"
        );

        let mut data_blocks = Vec::with_capacity(blocks.len());
        let mut offset = 0;
        for block in blocks {
            data_blocks.push(&data[offset..offset + block.data]);
            offset += block.data;
        }
        data_blocks
    }

    pub(crate) fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}

// Output
//------------------------------------------------------------------------------

impl QRCode {
    // Boolean matrix including the quiet zone; builds with fit if no
    // build is cached
    pub fn matrix(&mut self) -> QRResult<Vec<Vec<bool>>> {
        let quiet_zone = self.quiet_zone;
        Ok(self.ensure_built()?.to_matrix(quiet_zone))
    }

    pub fn print_ascii<W: Write>(&mut self, out: &mut W, tty: bool, invert: bool) -> QRResult<()> {
        let quiet_zone = self.quiet_zone;
        let canvas = self.ensure_built()?;
        render::write_ascii(canvas, quiet_zone, tty, invert, out).map_err(|_| QRError::IoError)
    }

    fn ensure_built(&mut self) -> QRResult<&QR> {
        if self.canvas.is_none() {
            self.build(true)?;
        }
        match self.canvas.as_ref() {
            Some(canvas) => Ok(canvas),
            None => unreachable!("Canvas is set on successful build"),
        }
    }

    #[cfg(test)]
    pub(crate) fn clone_canvas_for_tests(&self) -> QR {
        self.canvas.clone().expect("Symbol is not built")
    }
}
