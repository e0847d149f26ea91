//! Image preprocessing for the leaf classifiers

use image::{imageops::FilterType, DynamicImage, ImageResult};
use ndarray::{Array1, Array2, Array4, Axis};

/// Input size of the classical pipeline (150x150x3, flattened)
pub const PIPELINE_INPUT_SIZE: (u32, u32) = (150, 150);

/// Length of one flattened pipeline feature row
pub const PIPELINE_FEATURE_LEN: usize =
    (PIPELINE_INPUT_SIZE.0 * PIPELINE_INPUT_SIZE.1 * 3) as usize;

/// Input size of the convolutional network
pub const CNN_INPUT_SIZE: (u32, u32) = (224, 224);

/// Preprocess image for the classical pipeline
/// Resizes to 150x150 RGB, scales to [0, 1] and flattens HWC into one row
pub fn preprocess_for_pipeline(image: &DynamicImage) -> Array2<f32> {
    let (target_w, target_h) = PIPELINE_INPUT_SIZE;

    let resized = image.resize_exact(target_w, target_h, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let row: Vec<f32> = rgb.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    Array1::from_vec(row).insert_axis(Axis(0))
}

/// Preprocess image for the convolutional network
/// Resizes to 224x224 RGB and builds a batch of one in NHWC order, scaled to [0, 1]
pub fn preprocess_for_cnn(image: &DynamicImage) -> Array4<f32> {
    let (target_w, target_h) = CNN_INPUT_SIZE;

    let resized = image.resize_exact(target_w, target_h, FilterType::Triangle);
    image_to_nhwc(&resized)
}

fn image_to_nhwc(image: &DynamicImage) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Decode image from bytes with EXIF orientation handling
pub fn decode_image(data: &[u8]) -> ImageResult<DynamicImage> {
    let image = image::load_from_memory(data)?;
    Ok(apply_exif_orientation(data, image))
}

/// Phone cameras store rotation as an EXIF tag instead of rotating pixels
fn apply_exif_orientation(data: &[u8], image: DynamicImage) -> DynamicImage {
    use std::io::Cursor;

    let orientation = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif_data) => exif_data
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    };

    // https://exiftool.org/TagNames/EXIF.html (Orientation)
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgb};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_pipeline_features_shape_and_range() {
        let features = preprocess_for_pipeline(&gradient(300, 200));

        assert_eq!(features.shape(), &[1, PIPELINE_FEATURE_LEN]);
        assert!(features.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_pipeline_features_are_hwc_order() {
        let solid = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(150, 150, Rgb([255, 0, 51])));
        let features = preprocess_for_pipeline(&solid);

        assert_eq!(features[[0, 0]], 1.0);
        assert_eq!(features[[0, 1]], 0.0);
        assert!((features[[0, 2]] - 0.2).abs() < 1e-6);
        assert_eq!(features[[0, 3]], 1.0);
    }

    #[test]
    fn test_cnn_tensor_shape_and_range() {
        let tensor = preprocess_for_cnn(&gradient(640, 480));

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(tensor.as_slice().is_some());
    }

    #[test]
    fn test_preprocessing_is_deterministic() {
        let image = gradient(97, 131);

        assert_eq!(preprocess_for_pipeline(&image), preprocess_for_pipeline(&image));
        assert_eq!(preprocess_for_cnn(&image), preprocess_for_cnn(&image));
    }

    #[test]
    fn test_decode_image() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        gradient(20, 10)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(buffer.get_ref()).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));

        assert!(decode_image(b"definitely not an image").is_err());
    }

    /// Baseline JPEG with an APP1 segment holding a single Orientation entry
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let mut encoded = std::io::Cursor::new(Vec::new());
        gradient(width, height)
            .write_to(&mut encoded, image::ImageFormat::Jpeg)
            .unwrap();
        let encoded = encoded.into_inner();

        // Big-endian TIFF header, one IFD entry: tag 0x0112, SHORT, count 1
        let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01];
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut jpeg = encoded[..2].to_vec();
        jpeg.extend_from_slice(&[0xFF, 0xE1]);
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(&payload);
        jpeg.extend_from_slice(&encoded[2..]);
        jpeg
    }

    #[test]
    fn test_exif_rotation_swaps_dimensions() {
        for orientation in [5, 6, 7, 8] {
            let decoded = decode_image(&jpeg_with_orientation(20, 10, orientation)).unwrap();
            assert_eq!(decoded.dimensions(), (10, 20), "orientation {}", orientation);
        }
    }

    #[test]
    fn test_exif_flip_keeps_dimensions() {
        for orientation in [1, 2, 3, 4] {
            let decoded = decode_image(&jpeg_with_orientation(20, 10, orientation)).unwrap();
            assert_eq!(decoded.dimensions(), (20, 10), "orientation {}", orientation);
        }
    }

    #[test]
    fn test_exif_rotate90_moves_pixels() {
        // Left half dark, right half bright: after a 90 degree clockwise turn
        // the bright half ends up at the bottom
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(32, 16, |x, _| {
            if x < 16 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        }));

        let rotated = apply_exif_orientation(&jpeg_with_orientation(4, 4, 6), image);
        assert_eq!(rotated.dimensions(), (16, 32));
        assert_eq!(rotated.get_pixel(8, 4)[0], 0);
        assert_eq!(rotated.get_pixel(8, 28)[0], 255);
    }
}
