/// Axis-aligned face bounding box in source-frame pixel coordinates.
///
/// Detectors may report boxes that extend past the frame edges; use
/// [`FaceBox::clamp_to`] before cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in pixels. Negative extents count as zero.
    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Center of the box as reported by the detector (unclamped).
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Intersection of the box with a `frame_w × frame_h` frame.
    ///
    /// Returns `None` when nothing of the box remains inside the frame.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<FaceBox> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = (self.x.saturating_add(self.width)).min(frame_w as i32);
        let bottom = (self.y.saturating_add(self.height)).min(frame_h as i32);

        let width = right - left;
        let height = bottom - top;
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(FaceBox::new(left, top, width, height))
    }
}
