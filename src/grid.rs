use image::RgbImage;
use ndarray::Array3;

use crate::error::FormatError;

/// How the three samples of a pixel are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red. The order grids have straight after loading.
    Bgr,
    /// Red, green, blue. The order the renderer expects.
    Rgb,
}

impl ChannelOrder {
    pub fn swapped(self) -> Self {
        match self {
            ChannelOrder::Bgr => ChannelOrder::Rgb,
            ChannelOrder::Rgb => ChannelOrder::Bgr,
        }
    }
}

/// An 8-bit image indexed by `(row, column, channel)`.
///
/// The channel order is a tag describing how to read the samples, not a
/// property of the storage: the same buffer is BGR after loading and RGB
/// once the normalizer has permuted the channel axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    data: Array3<u8>,
    order: ChannelOrder,
}

impl PixelGrid {
    pub fn new(data: Array3<u8>, order: ChannelOrder) -> Self {
        Self { data, order }
    }

    /// Builds a grid from an interleaved row-major buffer.
    pub fn from_raw(
        height: usize,
        width: usize,
        channels: usize,
        raw: Vec<u8>,
        order: ChannelOrder,
    ) -> Result<Self, FormatError> {
        let data = Array3::from_shape_vec((height, width, channels), raw)
            .map_err(|_| FormatError::Dimensions { height, width })?;
        Ok(Self { data, order })
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn into_parts(self) -> (Array3<u8>, ChannelOrder) {
        (self.data, self.order)
    }

    /// The three samples at `(row, col)` in storage order.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` lies outside the grid or the grid has fewer
    /// than three channels.
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }

    pub fn ensure_three_channels(&self) -> Result<(), FormatError> {
        match self.channels() {
            3 => Ok(()),
            n => Err(FormatError::ChannelCount(n)),
        }
    }

    pub fn ensure_order(&self, expected: ChannelOrder) -> Result<(), FormatError> {
        if self.order == expected {
            Ok(())
        } else {
            Err(FormatError::ChannelOrder {
                expected,
                actual: self.order,
            })
        }
    }

    /// Copies the grid into an `image` buffer with samples in RGB order.
    pub fn to_rgb_image(&self) -> Result<RgbImage, FormatError> {
        self.ensure_three_channels()?;
        let (height, width, _) = self.data.dim();
        let (r, b) = match self.order {
            ChannelOrder::Rgb => (0, 2),
            ChannelOrder::Bgr => (2, 0),
        };
        let mut image = RgbImage::new(width as u32, height as u32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let (row, col) = (y as usize, x as usize);
            *pixel = image::Rgb([
                self.data[[row, col, r]],
                self.data[[row, col, 1]],
                self.data[[row, col, b]],
            ]);
        }
        Ok(image)
    }

    /// Mutable access to the samples as one contiguous row-major slice,
    /// relaying the array out first if a view left it strided.
    pub(crate) fn samples_mut(&mut self) -> Result<&mut [u8], FormatError> {
        if !self.data.is_standard_layout() {
            self.data = self.data.as_standard_layout().into_owned();
        }
        let (height, width, _) = self.data.dim();
        self.data
            .as_slice_mut()
            .ok_or(FormatError::Dimensions { height, width })
    }
}
