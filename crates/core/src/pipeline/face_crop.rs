use image::{imageops, RgbImage};

use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Why no crop was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropSkip {
    /// The frame is not well-formed RGB, or the target size is zero.
    InvalidInput,
    /// The box has no area inside the frame.
    DegenerateBox,
}

/// Cut the face out of `frame` and resize it to a `size × size` RGB crop.
///
/// The box is clamped to the frame first. A frame that is not well-formed
/// RGB is a caller bug: it fails fast in debug builds and is skipped
/// otherwise. The crop keeps the source frame's index and timestamp.
pub fn normalize(frame: &Frame, bbox: &FaceBox, size: u32) -> Result<Frame, CropSkip> {
    if !is_rgb_frame(frame) || size == 0 {
        return Err(CropSkip::InvalidInput);
    }
    let clamped = bbox
        .clamp_to(frame.width(), frame.height())
        .ok_or(CropSkip::DegenerateBox)?;

    let face = copy_region(frame, &clamped).ok_or(CropSkip::InvalidInput)?;
    let resized = if face.width() == size && face.height() == size {
        face
    } else {
        imageops::resize(&face, size, size, imageops::FilterType::Triangle)
    };

    Ok(Frame::new(
        resized.into_raw(),
        size,
        size,
        3,
        frame.index(),
        frame.timestamp(),
    ))
}

fn is_rgb_frame(frame: &Frame) -> bool {
    let expected = frame.width() as usize * frame.height() as usize * 3;
    let ok = frame.channels() == 3 && frame.data().len() == expected;
    debug_assert!(
        ok,
        "frame {} is not {}x{} RGB ({} channels, {} bytes)",
        frame.index(),
        frame.width(),
        frame.height(),
        frame.channels(),
        frame.data().len()
    );
    if !ok {
        log::error!(
            "Frame {} is not {}x{} RGB ({} channels, {} bytes), skipping crop",
            frame.index(),
            frame.width(),
            frame.height(),
            frame.channels(),
            frame.data().len()
        );
    }
    ok
}

/// Copies the rows of an in-bounds box into an owned image.
fn copy_region(frame: &Frame, region: &FaceBox) -> Option<RgbImage> {
    let stride = frame.width() as usize * 3;
    let (x, y) = (region.x as usize, region.y as usize);
    let (w, h) = (region.width as usize, region.height as usize);
    let data = frame.data();

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in y..y + h {
        let start = row * stride + x * 3;
        pixels.extend_from_slice(&data[start..start + w * 3]);
    }
    RgbImage::from_raw(w as u32, h as u32, pixels)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rstest::rstest;

    /// 8x8 frame: left half red, right half blue.
    fn split_frame() -> Frame {
        let mut data = Vec::with_capacity(8 * 8 * 3);
        for _y in 0..8 {
            for x in 0..8 {
                if x < 4 {
                    data.extend_from_slice(&[255, 0, 0]);
                } else {
                    data.extend_from_slice(&[0, 0, 255]);
                }
            }
        }
        Frame::new(data, 8, 8, 3, 7, Duration::from_millis(233))
    }

    #[test]
    fn test_crop_is_resized_to_square() {
        let crop = normalize(&split_frame(), &FaceBox::new(1, 1, 6, 4), 16).unwrap();
        assert_eq!(crop.width(), 16);
        assert_eq!(crop.height(), 16);
        assert_eq!(crop.channels(), 3);
        assert_eq!(crop.data().len(), 16 * 16 * 3);
    }

    #[test]
    fn test_crop_keeps_frame_identity() {
        let crop = normalize(&split_frame(), &FaceBox::new(0, 0, 4, 4), 4).unwrap();
        assert_eq!(crop.index(), 7);
        assert_eq!(crop.timestamp(), Duration::from_millis(233));
    }

    #[test]
    fn test_crop_reads_the_boxed_region() {
        let red = normalize(&split_frame(), &FaceBox::new(0, 0, 4, 8), 4).unwrap();
        assert_eq!(&red.data()[..3], &[255, 0, 0]);
        let blue = normalize(&split_frame(), &FaceBox::new(4, 0, 4, 8), 4).unwrap();
        assert_eq!(&blue.data()[..3], &[0, 0, 255]);
    }

    #[test]
    fn test_box_partly_outside_is_clamped() {
        let crop = normalize(&split_frame(), &FaceBox::new(-4, -4, 8, 8), 4).unwrap();
        assert!(crop.data().chunks(3).all(|px| px == [255, 0, 0]));
    }

    #[rstest]
    #[case::zero_width(FaceBox::new(2, 2, 0, 4))]
    #[case::negative_height(FaceBox::new(2, 2, 4, -1))]
    #[case::outside_right(FaceBox::new(8, 0, 4, 4))]
    #[case::outside_above(FaceBox::new(0, -10, 4, 4))]
    fn test_degenerate_box_is_skipped(#[case] bbox: FaceBox) {
        assert_eq!(normalize(&split_frame(), &bbox, 4).err(), Some(CropSkip::DegenerateBox));
    }

    #[test]
    fn test_zero_target_size_is_invalid_input() {
        assert_eq!(
            normalize(&split_frame(), &FaceBox::new(0, 0, 4, 4), 0).err(),
            Some(CropSkip::InvalidInput)
        );
    }

    #[test]
    fn test_copy_region_reads_rows_inside_box() {
        // 3x2 frame, pixel value = 10 * (y * 3 + x)
        let data: Vec<u8> = (0..6u8).flat_map(|i| [i * 10; 3]).collect();
        let frame = Frame::new(data, 3, 2, 3, 0, Duration::ZERO);
        let face = copy_region(&frame, &FaceBox::new(1, 0, 2, 2)).unwrap();
        assert_eq!(face.dimensions(), (2, 2));
        assert_eq!(face.get_pixel(0, 0).0, [10; 3]);
        assert_eq!(face.get_pixel(1, 1).0, [50; 3]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not 4x4 RGB")]
    fn test_non_rgb_frame_fails_fast_in_debug() {
        let gray = Frame::new(vec![0u8; 16], 4, 4, 1, 0, Duration::ZERO);
        let _ = normalize(&gray, &FaceBox::new(0, 0, 2, 2), 4);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_malformed_frame_is_invalid_input() {
        let bbox = FaceBox::new(0, 0, 2, 2);
        let gray = Frame::new(vec![0u8; 16], 4, 4, 1, 0, Duration::ZERO);
        assert_eq!(normalize(&gray, &bbox, 4).err(), Some(CropSkip::InvalidInput));
        let short = Frame::new(vec![0u8; 10], 4, 4, 3, 0, Duration::ZERO);
        assert_eq!(normalize(&short, &bbox, 4).err(), Some(CropSkip::InvalidInput));
    }
}
