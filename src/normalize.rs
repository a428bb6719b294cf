//! Turns a numeric dataset into a stack of displayable images.
//!
//! The first axis indexes images. Rank 2 stacks hold flattened square images,
//! rank 3 stacks hold gray images and rank 4 stacks hold `H x W x C` colour
//! images with `C` in {1, 3, 4}.

use std::path::Path;

use ndarray::{Array2, ArrayD, ArrayView1, Axis, Ix1, Ix2, Ix3, concatenate};
use rand::Rng;
use tracing::{debug, warn};

use crate::container::ArrayPayload;
use crate::error::ConvertError;
use crate::render::{self, Raster};

/// Upper bound on the coordinates sampled when guessing the value range.
pub const SAMPLE_COUNT: usize = 10;

/// Divisor applied when the sampled values look like 8-bit intensities.
pub const BYTE_RANGE: f64 = 255.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    pub values: ArrayD<f64>,
    pub rescaled: bool,
}

/// Absolute value, channel replication and range detection, in that order.
pub fn prepare_stack<R: Rng>(
    payload: &ArrayPayload,
    dataset_path: &str,
    rng: &mut R,
) -> Result<ImageStack, ConvertError> {
    let mut values = payload
        .to_f64()
        .ok_or_else(|| ConvertError::UnsupportedElement {
            path: dataset_path.to_string(),
            element: payload.element_name().to_string(),
        })?;

    if !(2..=4).contains(&values.ndim()) {
        return Err(ConvertError::ImageShape {
            shape: values.shape().to_vec(),
            message: format!("{dataset_path}: image stacks must have rank 2, 3 or 4"),
        });
    }

    values.mapv_inplace(f64::abs);

    if values.ndim() == 4 {
        match values.shape()[3] {
            1 => {
                let views = [values.view(), values.view(), values.view()];
                let replicated =
                    concatenate(Axis(3), &views).map_err(|err| ConvertError::ImageShape {
                        shape: values.shape().to_vec(),
                        message: err.to_string(),
                    })?;
                values = replicated;
            }
            3 | 4 => {}
            channels => {
                return Err(ConvertError::ImageShape {
                    shape: values.shape().to_vec(),
                    message: format!("{dataset_path}: unsupported channel count {channels}"),
                });
            }
        }
    }

    let rescaled = needs_rescale(&values, rng);
    if rescaled {
        values.mapv_inplace(|value| value / BYTE_RANGE);
    }
    debug!(path = dataset_path, rescaled, "prepared image stack");

    Ok(ImageStack { values, rescaled })
}

/// Samples up to [`SAMPLE_COUNT`] random coordinates and reports whether any
/// of them exceeds 1. This is a guess, not a min/max scan.
pub fn needs_rescale<R: Rng>(values: &ArrayD<f64>, rng: &mut R) -> bool {
    if values.is_empty() {
        return false;
    }
    let shape = values.shape().to_vec();
    (0..SAMPLE_COUNT).any(|_| {
        let index = shape
            .iter()
            .map(|len| rng.gen_range(0..*len))
            .collect::<Vec<_>>();
        values[index.as_slice()] > 1.0
    })
}

impl ImageStack {
    pub fn len(&self) -> usize {
        self.values.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn raster(&self, index: usize) -> Result<Raster, ConvertError> {
        let frame = self.values.index_axis(Axis(0), index);
        match frame.ndim() {
            1 => {
                let row = frame
                    .into_dimensionality::<Ix1>()
                    .map_err(|err| self.shape_err(err.to_string()))?;
                Ok(Raster::Gray(render::gray_from_unit(square_from_row(row).view())))
            }
            2 => {
                let plane = frame
                    .into_dimensionality::<Ix2>()
                    .map_err(|err| self.shape_err(err.to_string()))?;
                Ok(Raster::Gray(render::gray_from_unit(plane)))
            }
            _ => {
                let cube = frame
                    .into_dimensionality::<Ix3>()
                    .map_err(|err| self.shape_err(err.to_string()))?;
                Ok(Raster::Rgb(render::rgb_from_unit(cube)))
            }
        }
    }

    /// Writes `img{i}.jpg` for every image into `target_dir`.
    pub fn write_jpegs(&self, target_dir: &Path, quality: u8) -> Result<usize, ConvertError> {
        if self.values.ndim() == 2 {
            let width = self.values.shape()[1];
            let side = floor_sqrt(width);
            if side * side != width {
                warn!(width, side, "flattened images are not square, dropping trailing values");
            }
        }
        for index in 0..self.len() {
            let raster = self.raster(index)?;
            render::write_jpeg(&target_dir.join(format!("img{index}.jpg")), &raster, quality)?;
        }
        Ok(self.len())
    }

    fn shape_err(&self, message: String) -> ConvertError {
        ConvertError::ImageShape {
            shape: self.values.shape().to_vec(),
            message,
        }
    }
}

/// Reshapes a flattened row into a `floor(sqrt(len))` square, truncating the tail.
pub fn square_from_row(row: ArrayView1<'_, f64>) -> Array2<f64> {
    let side = floor_sqrt(row.len());
    Array2::from_shape_fn((side, side), |(r, c)| row[r * side + c])
}

pub fn floor_sqrt(value: usize) -> usize {
    let mut root = (value as f64).sqrt() as usize;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}
