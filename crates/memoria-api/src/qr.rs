use anyhow::Result;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Luma};
use qrcode::{EcLevel, QrCode};

/// PNG QR code pointing at a memorial's public page,
/// `{frontend_url}/view/{slug}`.
///
/// High error correction so codes stay scannable when printed small on a
/// plaque; 10px modules with the standard quiet zone.
pub fn memorial_qr_png(frontend_url: &str, slug: &str) -> Result<Vec<u8>> {
    let target = format!("{}/view/{}", frontend_url.trim_end_matches('/'), slug);

    let code = QrCode::with_error_correction_level(target.as_bytes(), EcLevel::H)?;
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(10, 10)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_png() {
        let png = memorial_qr_png("http://localhost:5173", "juan-perez-1a2b3c4d").unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        // Same payload either way, so identical codes.
        let a = memorial_qr_png("http://localhost:5173/", "slug-1").unwrap();
        let b = memorial_qr_png("http://localhost:5173", "slug-1").unwrap();
        assert_eq!(a, b);
    }
}
