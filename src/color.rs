use ndarray::Array3;

use crate::error::FormatError;
use crate::grid::{ChannelOrder, PixelGrid};

/// Swaps the first and last channel of every pixel, turning a BGR grid into
/// an RGB one and back.
///
/// Sample values are never changed, only which channel index holds them, so
/// applying this twice restores the input.
pub fn reorder_channels(grid: PixelGrid) -> Result<PixelGrid, FormatError> {
    grid.ensure_three_channels()?;
    let (data, order) = grid.into_parts();
    let reordered = Array3::from_shape_fn(data.raw_dim(), |(row, col, channel)| {
        data[[row, col, 2 - channel]]
    });
    Ok(PixelGrid::new(reordered, order.swapped()))
}

/// Normalizes a grid of either order to RGB.
pub fn to_rgb(grid: PixelGrid) -> Result<PixelGrid, FormatError> {
    match grid.order() {
        ChannelOrder::Rgb => {
            grid.ensure_three_channels()?;
            Ok(grid)
        }
        ChannelOrder::Bgr => reorder_channels(grid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gradient(order: ChannelOrder) -> PixelGrid {
        let raw = (0..4 * 5 * 3).map(|v| (v * 7 % 256) as u8).collect();
        PixelGrid::from_raw(4, 5, 3, raw, order).unwrap()
    }

    #[test]
    fn test_reorder_swaps_red_and_blue() {
        let grid = PixelGrid::from_raw(1, 2, 3, vec![1, 2, 3, 4, 5, 6], ChannelOrder::Bgr).unwrap();
        let rgb = reorder_channels(grid).unwrap();
        assert_eq!(rgb.order(), ChannelOrder::Rgb);
        assert_eq!(rgb.pixel(0, 0), [3, 2, 1]);
        assert_eq!(rgb.pixel(0, 1), [6, 5, 4]);
    }

    #[rstest]
    #[case(ChannelOrder::Bgr)]
    #[case(ChannelOrder::Rgb)]
    fn test_reorder_is_its_own_inverse(#[case] order: ChannelOrder) {
        let original = gradient(order);
        let twice = reorder_channels(reorder_channels(original.clone()).unwrap()).unwrap();
        assert_eq!(twice, original);
    }

    #[test]
    fn test_reorder_keeps_dimensions() {
        let rgb = reorder_channels(gradient(ChannelOrder::Bgr)).unwrap();
        assert_eq!((rgb.height(), rgb.width(), rgb.channels()), (4, 5, 3));
    }

    #[test]
    fn test_reorder_rejects_wrong_channel_count() {
        let grid = PixelGrid::new(Array3::zeros((2, 2, 4)), ChannelOrder::Bgr);
        assert_eq!(reorder_channels(grid), Err(FormatError::ChannelCount(4)));
    }

    #[test]
    fn test_to_rgb_leaves_rgb_untouched() {
        let grid = gradient(ChannelOrder::Rgb);
        assert_eq!(to_rgb(grid.clone()).unwrap(), grid);
    }
}
