//! Self-describing binary image files.
//!
//! Layout (all little-endian):
//!
//! ```text
//! magic      b"XRIMG"
//! version    u8
//! ndims      u8
//! dims       u32 × ndims        (ndarray axis order)
//! spacing    f64 × ndims
//! label_len  u32
//! label      u8 × label_len     (UTF-8)
//! compressed u8                 (0 or 1)
//! payload    f32 × Π dims, row-major; if compressed, an lz4 block with
//!            its uncompressed size prepended
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use binrw::{binrw, BinReaderExt, BinWriterExt};
use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn};

use crate::error::{FatalError, Result};
use crate::image::Image;

const VERSION: u8 = 1;

#[binrw]
#[brw(little, magic = b"XRIMG")]
#[derive(Debug, Clone, PartialEq)]
struct Header {
    #[br(assert(version == VERSION, "unsupported version {}", version))]
    version: u8,

    #[br(temp)]
    #[bw(calc = dims.len() as u8)]
    ndims: u8,

    #[br(count = ndims)]
    dims: Vec<u32>,

    #[br(count = ndims)]
    spacing: Vec<f64>,

    #[br(temp)]
    #[bw(calc = label.len() as u32)]
    label_len: u32,

    #[br(count = label_len, try_map = |bytes: Vec<u8>| String::from_utf8(bytes))]
    #[bw(map = |s: &String| s.as_bytes().to_vec())]
    label: String,

    #[br(map = |x: u8| x != 0)]
    #[bw(map = |x: &bool| *x as u8)]
    compressed: bool,
}

pub fn write(path: &Path, data: ArrayViewD<f32>, spacing: &[f64], label: &str, compress: bool) -> Result<()> {
    if spacing.len() != data.ndim() {
        return Err(FatalError::Format(format!("{} spacings given for {} dimensions", spacing.len(), data.ndim())))
    }
    let dims = data.shape().iter()
        .map(|&n| u32::try_from(n).map_err(|_| FatalError::Format(format!("dimension {n} too large"))))
        .collect::<Result<Vec<_>>>()?;
    let header = Header {
        version: VERSION,
        dims,
        spacing: spacing.to_vec(),
        label: label.into(),
        compressed: compress,
    };

    let payload: Vec<u8> = data.iter().flat_map(|x| x.to_le_bytes()).collect();
    let payload = if compress { lz4_flex::compress_prepend_size(&payload) } else { payload };

    let mut file = BufWriter::new(File::create(path)?);
    file.write_le(&header)?;
    file.write_all(&payload)?;
    file.flush()?;
    tracing::debug!("Wrote `{label}` {:?} to {}", data.shape(), path.display());
    Ok(())
}

/// Returns the pixel data in dynamic dimensions, the spacing and the label
pub fn read(path: &Path) -> Result<(ArrayD<f32>, Vec<f64>, String)> {
    let mut file = BufReader::new(File::open(path).map_err(FatalError::file(path))?);
    let header: Header = file.read_le()?;
    let mut payload = vec![];
    file.read_to_end(&mut payload)?;
    let payload = if header.compressed { lz4_flex::decompress_size_prepended(&payload)? } else { payload };

    let shape: Vec<usize> = header.dims.iter().map(|&n| n as usize).collect();
    let n = shape.iter()
        .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
        .filter(|n| n.checked_mul(4).is_some())
        .ok_or_else(|| FatalError::Format(format!("shape {shape:?} is too large")))?;
    if payload.len() != 4 * n {
        return Err(FatalError::Format(format!(
            "expected {n} values for shape {shape:?}, found {} bytes", payload.len())))
    }
    let values = payload.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| FatalError::Format(e.to_string()))?;
    Ok((data, header.spacing, header.label))
}

/// Read an image with a known number of dimensions, returning it with its
/// label
pub fn read_image<D: Dimension>(path: &Path) -> Result<(Image<D>, String)> {
    let (data, spacing, label) = read(path)?;
    let ndim = data.ndim();
    let data = data.into_dimensionality::<D>()
        .map_err(|_| FatalError::Format(format!("{} contains a {ndim}-dimensional image", path.display())))?;
    Ok((Image::new(data, spacing), label))
}
