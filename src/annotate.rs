use image::{ImageBuffer, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detector::DetectedFace;
use crate::error::FormatError;
use crate::grid::{ChannelOrder, PixelGrid};

pub const STROKE_COLOR: [u8; 3] = [255, 0, 0];
pub const STROKE_WIDTH: u32 = 4;

/// Border style for face rectangles. `color` is always given as RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: [u8; 3],
    pub width: u32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: STROKE_COLOR,
            width: STROKE_WIDTH,
        }
    }
}

/// Draws the outline of every face onto the grid.
///
/// The outline runs from `(x, y)` to `(x + width, y + height)` inclusive and
/// the stroke band is centred on it. Anything falling outside the grid is
/// clipped.
pub fn annotate(
    mut grid: PixelGrid,
    faces: &[DetectedFace],
    stroke: &Stroke,
) -> Result<PixelGrid, FormatError> {
    grid.ensure_three_channels()?;
    if faces.is_empty() || stroke.width == 0 {
        return Ok(grid);
    }

    let color = match grid.order() {
        ChannelOrder::Rgb => Rgb(stroke.color),
        ChannelOrder::Bgr => Rgb([stroke.color[2], stroke.color[1], stroke.color[0]]),
    };
    let (height, width) = (grid.height(), grid.width());

    // Samples are drawn as stored, so `color` above is already in grid order.
    let samples = grid.samples_mut()?;
    let mut canvas: ImageBuffer<Rgb<u8>, &mut [u8]> =
        ImageBuffer::from_raw(width as u32, height as u32, samples)
            .ok_or(FormatError::Dimensions { height, width })?;

    for face in faces {
        for rect in stroke_rects(face, stroke.width) {
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    Ok(grid)
}

/// Concentric one-pixel outlines making up a stroke `width` pixels thick.
fn stroke_rects(face: &DetectedFace, width: u32) -> impl Iterator<Item = Rect> + '_ {
    let half = (width / 2) as i32;
    (0..width as i32).filter_map(move |i| {
        let inset = i - half;
        let w = face.width + 1 - 2 * inset;
        let h = face.height + 1 - 2 * inset;
        (w > 0 && h > 0).then(|| Rect::at(face.x + inset, face.y + inset).of_size(w as u32, h as u32))
    })
}
