use super::*;

#[test]
fn test_from_gray_validates_sample_count() {
    let err = Image::from_gray(4, 4, vec![0.0; 15]).unwrap_err();
    assert!(matches!(
        err,
        ImageError::SampleCount {
            expected: 16,
            actual: 15,
            ..
        }
    ));
}

#[test]
fn test_pixel_access_rgb() {
    let samples: Vec<f32> = (0..2 * 3 * 3).map(|v| v as f32 / 100.0).collect();
    let image = Image::from_rgb(3, 2, samples).unwrap();

    assert!(image.dimensions().is_rgb());
    assert_eq!(image.pixel(0, 0), &[0.0, 0.01, 0.02]);
    // row 1, col 2 -> pixel index 5 -> sample 15
    assert_eq!(image.pixel(1, 2), &[0.15, 0.16, 0.17]);
}

#[test]
fn test_channel_extraction() {
    let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
    let image = Image::from_rgb(2, 1, samples).unwrap();
    let green = image.channel(1);
    assert_eq!(green.data(), &[0.2, 0.5]);
    assert_eq!(green.width(), 2);
    assert_eq!(green.height(), 1);
}

#[test]
fn test_from_dynamic_gray_stays_single_channel() {
    let gray = image::GrayImage::from_raw(2, 2, vec![0, 255, 51, 102]).unwrap();
    let image = Image::from_dynamic(&DynamicImage::ImageLuma8(gray));

    assert!(image.dimensions().is_grayscale());
    assert!((image.pixel(0, 1)[0] - 1.0).abs() < 1e-6);
    assert!((image.pixel(1, 0)[0] - 0.2).abs() < 1e-6);
}

#[test]
fn test_from_dynamic_rgba_drops_alpha() {
    let rgba = image::RgbaImage::from_raw(1, 1, vec![255, 0, 0, 10]).unwrap();
    let image = Image::from_dynamic(&DynamicImage::ImageRgba8(rgba));

    assert_eq!(image.channels(), 3);
    assert_eq!(image.pixel(0, 0), &[1.0, 0.0, 0.0]);
}

#[test]
fn test_from_file_roundtrip_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.png");
    let rgb = image::RgbImage::from_raw(2, 1, vec![255, 255, 255, 0, 0, 0]).unwrap();
    rgb.save(&path).unwrap();

    let image = Image::from_file(&path).unwrap();
    assert_eq!(image.dimensions(), ImageDimensions::new(2, 1, 3));
    assert_eq!(image.pixel(0, 0), &[1.0, 1.0, 1.0]);
    assert_eq!(image.pixel(0, 1), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_from_file_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"definitely not a jpeg").unwrap();

    let err = Image::from_file(&path).unwrap_err();
    assert!(matches!(err, ImageError::Decode { .. }));
    assert!(err.to_string().contains("broken.jpg"));
}

#[test]
fn test_plane_indexing_is_row_major() {
    let plane = Plane::new(3, 2, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(plane[(1, 0)], 3);
    assert_eq!(*plane.get(0, 2), 2);
    assert_eq!(plane.row(1), &[3, 4, 5]);
}
