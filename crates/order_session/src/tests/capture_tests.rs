use super::*;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
        .save(&path)
        .expect("write fixture png");
    path
}

#[test]
fn small_photo_is_sent_as_is() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_png(dir.path(), "menu.png", 64, 32);
    let original = fs::read(&path).expect("read fixture");

    let mut capture = ImageCapture::new(CaptureOptions::default());
    let id = capture.add_file(&path).expect("add");

    let image = &capture.images()[0];
    assert_eq!(image.id, id);
    assert_eq!(image.payload.media_type, "image/png");
    assert_eq!(
        STANDARD.decode(&image.payload.data_b64).expect("base64"),
        original
    );
    assert!(image.preview.ends_with("menu.png"));
}

#[test]
fn oversized_photo_is_downscaled_to_jpeg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_png(dir.path(), "wide.png", 400, 100);

    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 200 });
    capture.add_file(&path).expect("add");

    let payload = &capture.images()[0].payload;
    assert_eq!(payload.media_type, "image/jpeg");
    let bytes = STANDARD.decode(&payload.data_b64).expect("base64");
    let decoded = image::load_from_memory(&bytes).expect("decode jpeg");
    assert_eq!(decoded.dimensions(), (200, 50));
}

#[test]
fn zero_max_edge_disables_resizing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_png(dir.path(), "wide.png", 400, 100);

    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 0 });
    capture.add_file(&path).expect("add");
    assert_eq!(capture.images()[0].payload.media_type, "image/png");
}

#[test]
fn non_image_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    fs::write(&path, "not a menu").expect("write");

    let mut capture = ImageCapture::default();
    let err = capture.add_file(&path).expect_err("text file");
    assert!(matches!(err, CaptureError::NotAnImage { .. }));
    assert!(capture.is_empty());
}

#[test]
fn corrupt_jpeg_is_a_decode_error() {
    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 100 });
    let err = capture
        .add_bytes(b"definitely not jpeg".to_vec(), "image/jpeg", "camera")
        .expect_err("corrupt");
    assert!(matches!(err, CaptureError::Decode { .. }));
}

#[test]
fn unknown_image_formats_pass_through() {
    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 100 });
    capture
        .add_bytes(vec![0, 1, 2, 3], "image/heic", "iphone")
        .expect("heic passes through");
    assert_eq!(capture.images()[0].payload.media_type, "image/heic");
    assert_eq!(capture.images()[0].encoded_bytes, 4);
}

#[test]
fn ids_stay_unique_after_removal() {
    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 0 });
    let first = capture.add_bytes(vec![1], "image/heic", "a").expect("a");
    let second = capture.add_bytes(vec![2], "image/heic", "b").expect("b");
    assert!(capture.remove(first).is_some());
    assert!(capture.remove(first).is_none());
    let third = capture.add_bytes(vec![3], "image/heic", "c").expect("c");

    assert_ne!(third, first);
    assert_ne!(third, second);
    let order: Vec<_> = capture.payloads().into_iter().map(|p| p.data_b64).collect();
    assert_eq!(order, vec![STANDARD.encode([2]), STANDARD.encode([3])]);
}

#[test]
fn extensionless_photo_is_detected_from_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let png = write_png(dir.path(), "export.png", 16, 16);
    let path = dir.path().join("IMG_0001");
    fs::rename(&png, &path).expect("strip extension");

    let mut capture = ImageCapture::default();
    capture.add_file(&path).expect("png content without extension");
    assert_eq!(capture.images()[0].payload.media_type, "image/png");
}

/// Baseline JPEG of `width` x `height` with an EXIF APP1 segment carrying `orientation`.
fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([40, 40, 200]),
    ))
    .write_to(&mut encoded, ImageFormat::Jpeg)
    .expect("encode fixture jpeg");
    let jpeg = encoded.into_inner();

    let mut exif = b"Exif\0\0".to_vec();
    // Big-endian TIFF header, one IFD entry: Orientation (0x0112), SHORT, count 1.
    exif.extend_from_slice(&[b'M', b'M', 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08]);
    exif.extend_from_slice(&[0x00, 0x01]);
    exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    exif.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let segment_len = (exif.len() + 2) as u16;
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xff, 0xe1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&exif);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn downscaled_photo_is_rotated_upright_from_exif() {
    // Stored landscape, tagged "rotate 90° clockwise to display" (orientation 6).
    let bytes = jpeg_with_orientation(400, 100, 6);

    let mut capture = ImageCapture::new(CaptureOptions { max_edge: 200 });
    capture
        .add_bytes(bytes, "image/jpeg", "phone.jpg")
        .expect("add");

    let payload = &capture.images()[0].payload;
    assert_eq!(payload.media_type, "image/jpeg");
    let sent = STANDARD.decode(&payload.data_b64).expect("base64");
    let decoded = image::load_from_memory(&sent).expect("decode jpeg");
    assert_eq!(decoded.dimensions(), (50, 200));
}
