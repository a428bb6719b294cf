//! Raster conversion and JPEG encoding shared by both converters.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma, Rgb, RgbImage};
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Gray(GrayImage),
    Rgb(RgbImage),
}

/// Maps a unit-range intensity to a byte, clamping values outside `[0, 1]`.
pub fn unit_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Array index `[row, col]` becomes pixel `(col, row)`.
pub fn gray_from_unit(frame: ArrayView2<'_, f64>) -> GrayImage {
    let (height, width) = frame.dim();
    let mut image = GrayImage::new(width as u32, height as u32);
    for ((row, col), value) in frame.indexed_iter() {
        image.put_pixel(col as u32, row as u32, Luma([unit_to_byte(*value)]));
    }
    image
}

/// Uses the first three entries of the channel axis; a fourth (alpha) is dropped.
pub fn rgb_from_unit(frame: ArrayView3<'_, f64>) -> RgbImage {
    let (height, width, _) = frame.dim();
    let mut image = RgbImage::new(width as u32, height as u32);
    for (row, line) in frame.axis_iter(Axis(0)).enumerate() {
        for (col, pixel) in line.axis_iter(Axis(0)).enumerate() {
            image.put_pixel(
                col as u32,
                row as u32,
                Rgb([
                    unit_to_byte(pixel[0]),
                    unit_to_byte(pixel[1]),
                    unit_to_byte(pixel[2]),
                ]),
            );
        }
    }
    image
}

/// Piecewise-linear "bone" colormap: blue-tinted dark tones rising to white.
pub fn bone(value: f64) -> [u8; 3] {
    const RED: [(f64, f64); 3] = [(0.0, 0.0), (0.746032, 0.652778), (1.0, 1.0)];
    const GREEN: [(f64, f64); 4] = [
        (0.0, 0.0),
        (0.365079, 0.319444),
        (0.746032, 0.777778),
        (1.0, 1.0),
    ];
    const BLUE: [(f64, f64); 3] = [(0.0, 0.0), (0.365079, 0.444444), (1.0, 1.0)];

    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    [
        unit_to_byte(interpolate(&RED, value)),
        unit_to_byte(interpolate(&GREEN, value)),
        unit_to_byte(interpolate(&BLUE, value)),
    ]
}

fn interpolate(stops: &[(f64, f64)], value: f64) -> f64 {
    for pair in stops.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if value <= x1 {
            return y0 + (value - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    stops.last().map(|(_, y)| *y).unwrap_or(0.0)
}

/// Scales the slice to its own min/max and applies [`bone`]. A constant slice
/// renders as the bottom of the colormap.
pub fn bone_from_values(frame: ArrayView2<'_, f64>) -> RgbImage {
    let (min, max) = frame
        .iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(*value), hi.max(*value))
        });
    let span = max - min;

    let (height, width) = frame.dim();
    let mut image = RgbImage::new(width as u32, height as u32);
    for ((row, col), value) in frame.indexed_iter() {
        let unit = if span.is_finite() && span > 0.0 {
            (value - min) / span
        } else {
            0.0
        };
        image.put_pixel(col as u32, row as u32, Rgb(bone(unit)));
    }
    image
}

pub fn write_jpeg(path: &Path, raster: &Raster, quality: u8) -> Result<(), ConvertError> {
    let file = File::create(path)
        .map_err(|err| ConvertError::Filesystem(format!("create {}: {err}", path.display())))?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    let result = match raster {
        Raster::Gray(image) => encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        ),
        Raster::Rgb(image) => encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        ),
    };
    result.map_err(|err| ConvertError::ImageEncode(format!("{}: {err}", path.display())))
}
