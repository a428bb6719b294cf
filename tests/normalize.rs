use assert_matches::assert_matches;
use ndarray::{ArrayD, IxDyn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use scan_convert::container::ArrayPayload;
use scan_convert::error::ConvertError;
use scan_convert::normalize::{needs_rescale, prepare_stack};
use scan_convert::render::Raster;

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

#[test]
fn unit_range_values_are_left_alone() {
    let payload = ArrayPayload::Float32(ArrayD::from_elem(IxDyn(&[2, 3, 3]), -0.75));
    let stack = prepare_stack(&payload, "X", &mut rng()).unwrap();
    assert!(!stack.rescaled);
    assert!(stack.values.iter().all(|value| *value == 0.75));
}

#[test]
fn byte_range_values_are_divided_by_255() {
    let payload = ArrayPayload::UInt8(ArrayD::from_elem(IxDyn(&[1, 2, 2]), 255));
    let stack = prepare_stack(&payload, "X", &mut rng()).unwrap();
    assert!(stack.rescaled);
    assert!(stack.values.iter().all(|value| (*value - 1.0).abs() < 1e-12));
}

#[test]
fn sampling_can_miss_a_single_outlier() {
    let mut values = ArrayD::from_elem(IxDyn(&[4, 32, 32]), 0.5);
    values[[3, 31, 31]] = 900.0;
    let mut misses = 0;
    for seed in 0..20 {
        if !needs_rescale(&values, &mut ChaCha8Rng::seed_from_u64(seed)) {
            misses += 1;
        }
    }
    assert!(misses > 0);
}

#[test]
fn single_channel_colour_stack_is_replicated() {
    let payload = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[2, 3, 5, 1]), 0.2));
    let stack = prepare_stack(&payload, "images", &mut rng()).unwrap();
    assert_eq!(stack.values.shape(), &[2, 3, 5, 3]);
    assert_matches!(stack.raster(0).unwrap(), Raster::Rgb(image) if image.dimensions() == (5, 3));
}

#[test]
fn rgba_stack_drops_alpha() {
    let payload = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[1, 2, 2, 4]), 1.0));
    let stack = prepare_stack(&payload, "images", &mut rng()).unwrap();
    assert_matches!(stack.raster(0).unwrap(), Raster::Rgb(image) if image.get_pixel(0, 0).0 == [255, 255, 255]);
}

#[test]
fn unsupported_channel_counts_and_ranks_fail() {
    let two_channels = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[1, 2, 2, 2]), 0.1));
    assert_matches!(
        prepare_stack(&two_channels, "X", &mut rng()),
        Err(ConvertError::ImageShape { .. })
    );

    let rank_five = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[1, 1, 2, 2, 3]), 0.1));
    assert_matches!(
        prepare_stack(&rank_five, "X", &mut rng()),
        Err(ConvertError::ImageShape { .. })
    );
}

#[test]
fn non_square_rows_are_truncated() {
    let payload = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[1, 20]), 0.3));
    let stack = prepare_stack(&payload, "data", &mut rng()).unwrap();
    assert_matches!(stack.raster(0).unwrap(), Raster::Gray(image) if image.dimensions() == (4, 4));
}

#[test]
fn write_jpegs_names_images_by_index() {
    let temp = tempfile::tempdir().unwrap();
    let payload = ArrayPayload::Float64(ArrayD::from_elem(IxDyn(&[3, 6, 4]), 0.5));
    let stack = prepare_stack(&payload, "X", &mut rng()).unwrap();

    let written = stack.write_jpegs(temp.path(), 90).unwrap();

    assert_eq!(written, 3);
    let image = image::open(temp.path().join("img2.jpg")).unwrap();
    assert_eq!((image.width(), image.height()), (4, 6));
}
