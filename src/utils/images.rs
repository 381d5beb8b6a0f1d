//! Ingesta y normalización de imágenes
//!
//! Este módulo normaliza las fotos subidas (permisos de conducir, fotos de
//! estado del vehículo) antes de que lleguen al storage: transcodificación de
//! formatos legacy, reducción de tamaño, recompresión JPEG y techo duro de
//! peso. Las firmas no se recomprimen porque llevan transparencia.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::utils::errors::{AppError, AppResult};

/// Techo duro de peso por imagen tras la compresión
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Límites de la ingesta de imágenes
#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub max_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_dimension: 1600,
            jpeg_quality: 80,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

/// Imagen normalizada lista para subir al storage
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

fn format_metadata(format: ImageFormat) -> (&'static str, &'static str) {
    match format {
        ImageFormat::Png => ("image/png", "png"),
        ImageFormat::Jpeg => ("image/jpeg", "jpg"),
        ImageFormat::WebP => ("image/webp", "webp"),
        ImageFormat::Bmp => ("image/bmp", "bmp"),
        ImageFormat::Tiff => ("image/tiff", "tiff"),
        ImageFormat::Gif => ("image/gif", "gif"),
        _ => ("application/octet-stream", "bin"),
    }
}

/// Content type de unos bytes de imagen ya almacenados.
///
/// Se usa al incrustar imágenes recuperadas del storage (data URIs del
/// contrato); ante un formato irreconocible devuelve `image/png` como valor
/// inofensivo en lugar de fallar.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format_metadata(format).0,
        Err(_) => "image/png",
    }
}

fn decode(bytes: &[u8]) -> AppResult<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(bytes)
        .map_err(|_| AppError::Validation("imagen: formato no reconocido".to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AppError::Validation(format!("imagen: no se pudo decodificar ({})", e)))?;
    Ok((decoded, format))
}

/// Normalizar una foto: transcodificar, reducir y recomprimir a JPEG.
///
/// Superar el techo de peso tras la compresión es un error de validación
/// terminal para esa etapa, no se reintenta.
pub fn normalize_photo(bytes: &[u8], limits: &IngestLimits) -> AppResult<NormalizedImage> {
    let (decoded, source_format) = decode(bytes)?;

    if !matches!(
        source_format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    ) {
        log::info!(
            "📷 Transcodificando imagen legacy {:?} a JPEG",
            source_format
        );
    }

    let resized = if decoded.width() > limits.max_dimension || decoded.height() > limits.max_dimension
    {
        decoded.resize(limits.max_dimension, limits.max_dimension, FilterType::Triangle)
    } else {
        decoded
    };

    // JPEG no admite canal alfa, se aplana a RGB
    let flattened = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, limits.jpeg_quality);
    flattened
        .write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(format!("error recomprimiendo imagen: {}", e)))?;

    if out.len() > limits.max_bytes {
        return Err(AppError::Validation(format!(
            "imagen: supera el límite de {} MB tras la compresión",
            limits.max_bytes / (1024 * 1024)
        )));
    }

    Ok(NormalizedImage {
        width: flattened.width(),
        height: flattened.height(),
        bytes: out,
        content_type: "image/jpeg",
        extension: "jpg",
    })
}

/// Validar una imagen de firma sin recomprimirla.
///
/// Las firmas se dibujan sobre fondo transparente; se conserva el formato
/// original y solo se aplica el techo de peso.
pub fn check_signature_image(bytes: &[u8], limits: &IngestLimits) -> AppResult<NormalizedImage> {
    let (decoded, format) = decode(bytes)?;

    if bytes.len() > limits.max_bytes {
        return Err(AppError::Validation(format!(
            "firma: supera el límite de {} MB",
            limits.max_bytes / (1024 * 1024)
        )));
    }

    let (content_type, extension) = format_metadata(format);
    Ok(NormalizedImage {
        width: decoded.width(),
        height: decoded.height(),
        bytes: bytes.to_vec(),
        content_type,
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([120, 30, 200]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([10, 220, 40]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Bmp)
            .unwrap();
        out
    }

    #[test]
    fn test_normalize_recompresses_to_jpeg() {
        let result = normalize_photo(&png_bytes(320, 240), &IngestLimits::default()).unwrap();
        assert_eq!(result.content_type, "image/jpeg");
        assert_eq!(result.extension, "jpg");
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_normalize_transcodes_legacy_bmp() {
        let result = normalize_photo(&bmp_bytes(64, 64), &IngestLimits::default()).unwrap();
        assert_eq!(result.content_type, "image/jpeg");
        assert_eq!((result.width, result.height), (64, 64));
    }

    #[test]
    fn test_normalize_downscales_oversized_photos() {
        let limits = IngestLimits {
            max_dimension: 100,
            ..IngestLimits::default()
        };
        let result = normalize_photo(&png_bytes(400, 200), &limits).unwrap();
        assert!(result.width <= 100 && result.height <= 100);
        // Mantiene la proporción 2:1
        assert_eq!((result.width, result.height), (100, 50));
    }

    #[test]
    fn test_normalize_rejects_undecodable_input() {
        let garbage = vec![0u8, 1, 2, 3, 4, 5, 6, 7];
        match normalize_photo(&garbage, &IngestLimits::default()) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("formato")),
            other => panic!("se esperaba Validation, fue {:?}", other.err()),
        }
    }

    #[test]
    fn test_normalize_enforces_size_ceiling() {
        let limits = IngestLimits {
            max_bytes: 16,
            ..IngestLimits::default()
        };
        match normalize_photo(&png_bytes(320, 240), &limits) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("límite")),
            other => panic!("se esperaba Validation, fue {:?}", other.err()),
        }
    }

    #[test]
    fn test_signature_keeps_original_format() {
        let img = ImageBuffer::from_pixel(80, 40, Rgba::<u8>([0, 0, 0, 0]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let result = check_signature_image(&png, &IngestLimits::default()).unwrap();
        assert_eq!(result.content_type, "image/png");
        assert_eq!(result.bytes, png);
    }
}
