use std::path::Path;

use ndarray::{Array, Dimension, Ix2, Ix3, NdIndex, Zip};

use units::todo::Intensityf32;
use crate::error::Result;
use crate::io;

/// Dense image with the physical size of its pixels (voxels) along each axis,
/// in the same axis order as `data`
#[derive(Debug, Clone, PartialEq)]
pub struct Image<D: Dimension> {
    pub data: Array<Intensityf32, D>,
    pub spacing: Vec<f64>,
}

pub type Image2 = Image<Ix2>;
pub type Image3 = Image<Ix3>;

impl<D: Dimension> Image<D> {
    pub fn new(data: Array<Intensityf32, D>, spacing: Vec<f64>) -> Self { Self { data, spacing } }

    pub fn zeros<Sh: ndarray::ShapeBuilder<Dim = D>>(shape: Sh, spacing: Vec<f64>) -> Self {
        Self::new(Array::zeros(shape), spacing)
    }

    pub fn shape(&self) -> &[usize] { self.data.shape() }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// `None` for an empty image
    pub fn min(&self) -> Option<Intensityf32> {
        self.data.iter().copied().reduce(Intensityf32::min)
    }

    /// `None` for an empty image
    pub fn max(&self) -> Option<Intensityf32> {
        self.data.iter().copied().reduce(Intensityf32::max)
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.data.iter().map(|&x| x as f64).sum::<f64>() / self.len() as f64)
    }

    /// Zero-mean normalised cross-correlation. `None` if the shapes differ or
    /// either image is constant.
    pub fn zncc(&self, other: &Self) -> Option<f64> {
        if self.shape() != other.shape() { return None }
        let (ma, mb) = (self.mean()?, other.mean()?);
        let (mut ab, mut aa, mut bb) = (0.0, 0.0, 0.0);
        Zip::from(&self.data).and(&other.data).for_each(|&a, &b| {
            let (a, b) = (a as f64 - ma, b as f64 - mb);
            ab += a * b;
            aa += a * a;
            bb += b * b;
        });
        let denominator = (aa * bb).sqrt();
        (denominator > 0.0).then(|| ab / denominator)
    }

    /// Root mean square difference. `None` if the shapes differ or the images
    /// are empty.
    pub fn rmse(&self, other: &Self) -> Option<f64> {
        if self.shape() != other.shape() || self.is_empty() { return None }
        let mut sum = 0.0;
        Zip::from(&self.data).and(&other.data).for_each(|&a, &b| {
            let d = a as f64 - b as f64;
            sum += d * d;
        });
        Some((sum / self.len() as f64).sqrt())
    }

    /// Write as a tagged binary image file (see `io::tagged`)
    pub fn write_to_file(&self, path: &Path, label: &str, compress: bool) -> Result<()> {
        io::tagged::write(path, self.data.view().into_dyn(), &self.spacing, label, compress)
    }

    /// Write the pixel values only, as little-endian `f32`s in row-major order
    pub fn write_to_raw_file(&self, path: &Path) -> Result<()> {
        Ok(io::raw::write(self.data.iter().copied(), path)?)
    }
}

impl Image2 {
    pub fn read_from_file(path: &Path) -> Result<(Self, String)> { io::tagged::read_image(path) }
}

impl Image3 {
    pub fn read_from_file(path: &Path) -> Result<(Self, String)> { io::tagged::read_image(path) }
}

impl<D: Dimension, I: NdIndex<D>> core::ops::Index<I> for Image<D> {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, i: I) -> &Self::Output { &self.data[i] }
}

impl<D: Dimension, I: NdIndex<D>> core::ops::IndexMut<I> for Image<D> {
    #[inline]
    fn index_mut(&mut self, i: I) -> &mut Self::Output { &mut self.data[i] }
}
