use std::path::Path;

use image::{DynamicImage, ImageError};
use log::debug;

use crate::error::LoadError;
use crate::grid::{ChannelOrder, PixelGrid};

/// Decodes an image file into a BGR pixel grid.
///
/// Alpha is dropped and luma images are expanded, so the grid always has
/// three channels.
pub fn load_image(path: &Path) -> Result<PixelGrid, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let img = image::open(path).map_err(|err| match err {
        ImageError::IoError(source) => LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
        other => LoadError::Undecodable {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let grid = into_bgr_grid(img).map_err(|reason| LoadError::Undecodable {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!(
        "Loaded {:?}: {}x{}x{}",
        path,
        grid.height(),
        grid.width(),
        grid.channels()
    );
    Ok(grid)
}

/// Same as [`load_image`] for an encoded image already in memory.
pub fn load_image_from_memory(bytes: &[u8]) -> Result<PixelGrid, LoadError> {
    let undecodable = |reason: String| LoadError::Undecodable {
        path: "<memory>".into(),
        reason,
    };
    let img = image::load_from_memory(bytes).map_err(|err| undecodable(err.to_string()))?;
    into_bgr_grid(img).map_err(undecodable)
}

fn into_bgr_grid(img: DynamicImage) -> Result<PixelGrid, String> {
    let rgb = img.into_rgb8();
    let (width, height) = rgb.dimensions();

    let mut raw = rgb.into_raw();
    for pixel in raw.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }

    PixelGrid::from_raw(height as usize, width as usize, 3, raw, ChannelOrder::Bgr)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_matches_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);

        let grid = load_image(&path).unwrap();
        assert_eq!(grid.height(), 80);
        assert_eq!(grid.width(), 100);
        assert_eq!(grid.channels(), 3);
    }

    #[test]
    fn test_load_stores_samples_blue_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 4, 4);

        let grid = load_image(&path).unwrap();
        assert_eq!(grid.order(), ChannelOrder::Bgr);
        assert_eq!(grid.pixel(0, 0), [200, 100, 50]);
    }

    #[test]
    fn test_load_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]))
            .save(&path)
            .unwrap();

        let grid = load_image(&path).unwrap();
        assert_eq!(grid.channels(), 3);
        assert_eq!(grid.pixel(1, 2), [3, 2, 1]);
    }

    #[test]
    fn test_load_nonexistent_is_not_found() {
        let err = load_image(Path::new("/nonexistent/test.png")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_load_garbage_is_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, LoadError::Undecodable { .. }));
    }

    #[test]
    fn test_load_from_memory() {
        let mut bytes = Vec::new();
        image::RgbImage::from_pixel(5, 7, image::Rgb([9, 8, 7]))
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .unwrap();

        let grid = load_image_from_memory(&bytes).unwrap();
        assert_eq!((grid.height(), grid.width()), (7, 5));
        assert_eq!(grid.pixel(6, 4), [7, 8, 9]);
    }
}
