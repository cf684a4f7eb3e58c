//! Copies each template's `img/` directory into its output folder.
//!
//! By default this is a plain byte copy. With [`ImageOptions::optimize`]
//! PNG and JPEG files are re-encoded and the smaller of the two versions is
//! kept; everything else (GIF, SVG, ...) is copied untouched.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

use crate::config::ImageOptions;
use crate::folder::TemplateFolder;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not optimize {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Copy one folder's images. Returns the number of files written.
pub fn copy_images(folder: &TemplateFolder, options: &ImageOptions) -> Result<usize, ImageError> {
    let source = folder.images_dir();
    if !source.is_dir() {
        debug!("{}: no image directory, skipping", folder.name);
        return Ok(0);
    }

    let dest = folder.output_images_dir();
    std::fs::create_dir_all(&dest)?;

    let mut count = 0;
    for entry in std::fs::read_dir(&source)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let bytes = std::fs::read(&path)?;
        let bytes = if options.optimize {
            optimize(&path, &bytes, options)?.unwrap_or(bytes)
        } else {
            bytes
        };

        std::fs::write(dest.join(entry.file_name()), bytes)?;
        count += 1;
    }

    debug!("{}: copied {} images", folder.name, count);
    Ok(count)
}

/// Re-encode a PNG or JPEG. `None` when the format is not handled or the
/// result is not smaller than the original.
fn optimize(path: &Path, bytes: &[u8], options: &ImageOptions) -> Result<Option<Vec<u8>>, ImageError> {
    let Some(format) = ImageFormat::from_path(path).ok() else {
        return Ok(None);
    };
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Ok(None);
    }

    let codec_err = |source| ImageError::Codec {
        path: path.display().to_string(),
        source,
    };

    let img = image::load_from_memory_with_format(bytes, format).map_err(codec_err)?;
    let mut out = Vec::new();

    match format {
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
            img.write_with_encoder(encoder).map_err(codec_err)?;
        }
        _ => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
            rgb.write_with_encoder(encoder).map_err(codec_err)?;
        }
    }

    Ok((out.len() < bytes.len()).then_some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use image::{Rgb, RgbImage};

    fn folder(root: &Path) -> TemplateFolder {
        let paths = PathsConfig {
            emails: root.join("emails"),
            dist: root.join("dist"),
            ..PathsConfig::default()
        };
        TemplateFolder::new("promo", &paths)
    }

    #[test]
    fn copy_is_byte_identical_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = folder(tmp.path());
        let img = folder.images_dir();
        std::fs::create_dir_all(img.join("nested")).unwrap();
        std::fs::write(img.join("logo.png"), b"not really a png").unwrap();
        std::fs::write(img.join("icon.svg"), b"<svg/>").unwrap();
        std::fs::write(img.join("nested/skip.gif"), b"GIF89a").unwrap();

        let count = copy_images(&folder, &ImageOptions::default()).unwrap();

        assert_eq!(count, 2);
        let out = folder.output_images_dir();
        let mut names: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["icon.svg", "logo.png"]);
        assert_eq!(std::fs::read(out.join("logo.png")).unwrap(), b"not really a png");
    }

    #[test]
    fn missing_image_dir_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = folder(tmp.path());
        assert_eq!(copy_images(&folder, &ImageOptions::default()).unwrap(), 0);
        assert!(!folder.output_images_dir().exists());
    }

    #[test]
    fn optimize_never_grows_files() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = folder(tmp.path());
        std::fs::create_dir_all(folder.images_dir()).unwrap();

        let png = folder.images_dir().join("flat.png");
        RgbImage::from_pixel(64, 64, Rgb([200, 30, 30])).save(&png).unwrap();
        std::fs::write(folder.images_dir().join("anim.gif"), b"GIF89a").unwrap();
        let original = std::fs::read(&png).unwrap();

        let options = ImageOptions {
            optimize: true,
            ..ImageOptions::default()
        };
        copy_images(&folder, &options).unwrap();

        let written = std::fs::read(folder.output_images_dir().join("flat.png")).unwrap();
        assert!(written.len() <= original.len());
        assert!(image::load_from_memory(&written).is_ok());
        assert_eq!(
            std::fs::read(folder.output_images_dir().join("anim.gif")).unwrap(),
            b"GIF89a"
        );
    }

    #[test]
    fn optimize_rejects_corrupt_png() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = folder(tmp.path());
        std::fs::create_dir_all(folder.images_dir()).unwrap();
        std::fs::write(folder.images_dir().join("bad.png"), b"garbage").unwrap();

        let options = ImageOptions {
            optimize: true,
            ..ImageOptions::default()
        };
        let err = copy_images(&folder, &options).unwrap_err();
        assert!(matches!(err, ImageError::Codec { .. }));
    }
}
