//! Raster driver detection from leading bytes.
//!
//! Examines magic bytes the same way GDAL's drivers identify a dataset before
//! opening it. Only the drivers the gateway cares about are recognised:
//!
//! - **GTiff**: classic TIFF and BigTIFF, either byte order
//! - **VRT**: GDAL virtual raster XML (`<VRTDataset>` root element)
//! - **PNG**, **JPEG**, **JP2OpenJPEG**

/// Raster driver reported by the opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterDriver {
    /// TIFF / BigTIFF / COG
    GTiff,

    /// GDAL virtual raster (XML that may reference arbitrary paths)
    Vrt,

    /// Portable Network Graphics
    Png,

    /// JPEG / JFIF
    Jpeg,

    /// JPEG 2000 (JP2 container or raw codestream)
    Jp2,
}

impl RasterDriver {
    /// GDAL short name of the driver.
    pub const fn name(&self) -> &'static str {
        match self {
            RasterDriver::GTiff => "GTiff",
            RasterDriver::Vrt => "VRT",
            RasterDriver::Png => "PNG",
            RasterDriver::Jpeg => "JPEG",
            RasterDriver::Jp2 => "JP2OpenJPEG",
        }
    }
}

/// Number of leading bytes read for detection.
///
/// Enough for every binary signature plus an XML declaration and a comment
/// or two ahead of the VRT root element.
pub const DETECTION_BYTES: usize = 1024;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JP2_SIGNATURE: &[u8] = b"\x00\x00\x00\x0cjP  \r\n\x87\n";
const J2K_CODESTREAM: &[u8] = b"\xff\x4f\xff\x51";
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";
const VRT_ROOT: &[u8] = b"<vrtdataset";

/// Detect the raster driver from the leading bytes of a resource.
///
/// Returns `None` when no known signature matches.
pub fn detect_driver(bytes: &[u8]) -> Option<RasterDriver> {
    if is_tiff_header(bytes) {
        return Some(RasterDriver::GTiff);
    }
    if bytes.starts_with(PNG_SIGNATURE) {
        return Some(RasterDriver::Png);
    }
    if bytes.starts_with(JP2_SIGNATURE) || bytes.starts_with(J2K_CODESTREAM) {
        return Some(RasterDriver::Jp2);
    }
    if bytes.len() >= 3 && bytes[..3] == [0xFF, 0xD8, 0xFF] {
        return Some(RasterDriver::Jpeg);
    }
    if is_vrt_document(bytes) {
        return Some(RasterDriver::Vrt);
    }
    None
}

/// Check if bytes represent a TIFF or BigTIFF header.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }

    match (&bytes[..2], bytes[2], bytes[3]) {
        (b"II", 42, 0) | (b"II", 43, 0) => true,
        (b"MM", 0, 42) | (b"MM", 0, 43) => true,
        _ => false,
    }
}

/// Check whether an XML document's root element is `<VRTDataset`.
///
/// Skips a UTF-8 BOM, whitespace, the XML declaration, processing
/// instructions and comments before looking at the root element.
pub fn is_vrt_document(bytes: &[u8]) -> bool {
    let mut rest = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    loop {
        rest = trim_ascii_start(rest);
        if rest.starts_with(b"<?") {
            match find(rest, b"?>") {
                Some(end) => rest = &rest[end + 2..],
                None => return false,
            }
        } else if rest.starts_with(b"<!--") {
            match find(rest, b"-->") {
                Some(end) => rest = &rest[end + 3..],
                None => return false,
            }
        } else {
            break;
        }
    }

    rest.len() >= VRT_ROOT.len() && rest[..VRT_ROOT.len()].eq_ignore_ascii_case(VRT_ROOT)
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// =============================================================================
// Tests
// =============================================================================
