//! Composite image generator.
//!
//! Renders a source image, a small logo mark and a QR code onto one white
//! canvas and encodes it as PNG. The geometry is fixed by [`Layout`]; the
//! output size never depends on the source resolution.
//!
//! When only one of the two inputs is usable the composer degrades instead of
//! failing: a payload that cannot be encoded yields the source alone, and a
//! source that cannot be loaded yields the QR alone.

use crate::{
    errors::{ClientError, ClientResult},
    services::{
        media_client::ensure_success,
        share::{SHARE_TEXT, SHARE_TITLE, ShareTarget, SharedFile},
    },
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::Utc;
use image::{
    DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use qrcode::{Color, EcLevel, QrCode};
use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Light modules around the symbol, in module units.
pub const QUIET_ZONE_MODULES: u32 = 4;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MARK_FILL: Rgba<u8> = Rgba([124, 58, 237, 255]);

/// Canvas geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub image_height: u32,
    pub qr_size: u32,
    pub margin: u32,
    pub qr_margin_top: u32,
    pub logo_size: u32,
    pub logo_margin: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 900,
            image_height: 1320,
            qr_size: 300,
            margin: 50,
            qr_margin_top: 50,
            logo_size: 64,
            logo_margin: 12,
        }
    }
}

impl Layout {
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            self.width,
            self.image_height + self.qr_size + 2 * self.margin + self.qr_margin_top,
        )
    }

    /// Bottom-left corner of the image area, inset by `logo_margin`.
    pub fn logo_origin(&self) -> (i64, i64) {
        let y = i64::from(self.margin) + i64::from(self.image_height)
            - i64::from(self.logo_size)
            - i64::from(self.logo_margin);
        (i64::from(self.logo_margin), y)
    }

    /// Horizontally centred below the image.
    pub fn qr_origin(&self) -> (i64, i64) {
        let x = (i64::from(self.width) - i64::from(self.qr_size)) / 2;
        let y = i64::from(self.image_height) + i64::from(self.margin) + i64::from(self.qr_margin_top);
        (x, y)
    }
}

/// Where the source image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    /// `http://` and `https://` strings are URLs; anything else is a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Url(input.to_string())
        } else {
            ImageSource::Path(PathBuf::from(input))
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Url(url) => f.write_str(url),
        }
    }
}

/// Encoded output of [`Composer::compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// Full canvas: image, logo and QR.
    Composite(Bytes),
    /// The source could not be loaded; the QR rendered alone.
    QrOnly(Bytes),
    /// The payload could not be encoded; the source bytes unchanged.
    SourceOnly(Bytes),
}

impl Composition {
    pub fn bytes(&self) -> &Bytes {
        match self {
            Composition::Composite(b) | Composition::QrOnly(b) | Composition::SourceOnly(b) => b,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Composition::Composite(_))
    }

    /// Download name: `{stem}-{stamp_ms}.png`, or the `-qr` / `-image`
    /// suffix for degraded output.
    pub fn file_name(&self, stem: &str, stamp_ms: i64) -> String {
        match self {
            Composition::Composite(_) => format!("{}-{}.png", stem, stamp_ms),
            Composition::QrOnly(_) => format!("{}-qr.png", stem),
            Composition::SourceOnly(_) => format!("{}-image.png", stem),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Composition::SourceOnly(bytes) => image::guess_format(bytes)
                .map(|format| format.to_mime_type())
                .unwrap_or("application/octet-stream"),
            _ => "image/png",
        }
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime(),
            general_purpose::STANDARD.encode(self.bytes())
        )
    }
}

/// Where a composition goes once rendered.
pub enum Delivery<'a> {
    /// Write into this directory.
    Download(&'a Path),
    Share(&'a dyn ShareTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Saved(PathBuf),
    Shared { file_name: String },
}

pub struct Composer {
    http: reqwest::Client,
    layout: Layout,
    logo: RgbaImage,
}

impl Composer {
    /// Composer using the built-in logo mark.
    pub fn new(http: reqwest::Client, layout: Layout) -> Self {
        let logo = default_logo(layout.logo_size);
        Self { http, layout, logo }
    }

    /// Replace the logo; it is scaled to `logo_size` square.
    pub fn with_logo(mut self, logo: &DynamicImage) -> Self {
        let size = self.layout.logo_size;
        self.logo = logo.resize_exact(size, size, FilterType::Triangle).to_rgba8();
        self
    }

    pub async fn load_logo(path: &Path) -> ClientResult<DynamicImage> {
        let data = fs::read(path).await?;
        Ok(image::load_from_memory(&data)?)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[instrument(skip(self, source, payload), fields(source = %source))]
    pub async fn compose(&self, source: &ImageSource, payload: &str) -> ClientResult<Composition> {
        let qr = render_qr(payload, self.layout.qr_size);
        let loaded = self.load_source(source).await;

        match (qr, loaded) {
            (Ok(qr), Ok((_, decoded))) => {
                let canvas = compose_raster(&decoded, &qr, &self.logo, &self.layout);
                let png = encode_png(&DynamicImage::ImageRgba8(canvas))?;
                info!("composed {} byte PNG", png.len());
                Ok(Composition::Composite(png))
            }
            (Ok(qr), Err(err)) => {
                warn!("source {} unusable, emitting QR only: {}", source, err);
                Ok(Composition::QrOnly(encode_png(&DynamicImage::ImageLuma8(qr))?))
            }
            (Err(err), Ok((raw, _))) => {
                warn!("QR encoding failed, emitting source only: {}", err);
                Ok(Composition::SourceOnly(raw))
            }
            (Err(qr_err), Err(source_err)) => {
                warn!("source {} unusable as well: {}", source, source_err);
                Err(qr_err)
            }
        }
    }

    /// Compose and hand the result to `delivery`.
    ///
    /// A share target without file support is rejected before anything is
    /// rendered or written. The composition is returned alongside the
    /// delivery so callers can also render it as a data URL.
    pub async fn compose_and_deliver(
        &self,
        source: &ImageSource,
        payload: &str,
        file_stem: &str,
        delivery: Delivery<'_>,
    ) -> ClientResult<(Composition, Delivered)> {
        if let Delivery::Share(target) = &delivery {
            if !target.can_share_files() {
                warn!("share target cannot take files");
                return Err(ClientError::ShareUnsupported);
            }
        }

        let composition = self.compose(source, payload).await?;
        let file_name = composition.file_name(file_stem, Utc::now().timestamp_millis());

        let delivered = match delivery {
            Delivery::Download(dir) => {
                let path = write_atomically(dir, &file_name, composition.bytes()).await?;
                info!("saved composition to {}", path.display());
                Delivered::Saved(path)
            }
            Delivery::Share(target) => {
                let file = SharedFile {
                    file_name: file_name.clone(),
                    mime: composition.mime(),
                    bytes: composition.bytes().clone(),
                    title: SHARE_TITLE,
                    text: SHARE_TEXT,
                };
                target.share(file).await?;
                Delivered::Shared { file_name }
            }
        };
        Ok((composition, delivered))
    }

    /// Raw bytes plus the decoded image.
    async fn load_source(&self, source: &ImageSource) -> ClientResult<(Bytes, DynamicImage)> {
        let raw = match source {
            ImageSource::Path(path) => Bytes::from(fs::read(path).await?),
            ImageSource::Url(url) => {
                debug!("fetching source image {}", url);
                let response = self.http.get(url).send().await?;
                let response = ensure_success(response, "fetch source image", |status| {
                    ClientError::Status {
                        operation: "fetch source image",
                        status: status.as_u16(),
                    }
                })?;
                response.bytes().await?
            }
        };
        let decoded = image::load_from_memory(&raw)?;
        Ok((raw, decoded))
    }
}

/// Encode `payload` at error-correction level H and draw it `size` pixels
/// square, quiet zone included, sampling modules nearest-neighbour.
pub fn render_qr(payload: &str, size: u32) -> ClientResult<GrayImage> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let total = modules + 2 * QUIET_ZONE_MODULES;

    Ok(GrayImage::from_fn(size, size, |x, y| {
        let mx = (u64::from(x) * u64::from(total) / u64::from(size)) as u32;
        let my = (u64::from(y) * u64::from(total) / u64::from(size)) as u32;
        let inside = QUIET_ZONE_MODULES..QUIET_ZONE_MODULES + modules;
        let dark = inside.contains(&mx)
            && inside.contains(&my)
            && colors[((my - QUIET_ZONE_MODULES) * modules + (mx - QUIET_ZONE_MODULES)) as usize]
                == Color::Dark;
        if dark { Luma([0]) } else { Luma([255]) }
    }))
}

/// Region of the source kept by a centre crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centred region of a `src_w × src_h` image with the aspect of
/// `out_w × out_h`. Only the dimension in excess is cropped.
pub fn center_crop(src_w: u32, src_h: u32, out_w: u32, out_h: u32) -> CropRect {
    let (sw, sh) = (u64::from(src_w.max(1)), u64::from(src_h.max(1)));
    let (ow, oh) = (u64::from(out_w.max(1)), u64::from(out_h.max(1)));

    if sw * oh > ow * sh {
        let width = (sh * ow / oh).clamp(1, sw);
        CropRect {
            x: ((sw - width) / 2) as u32,
            y: 0,
            width: width as u32,
            height: sh as u32,
        }
    } else {
        let height = (sw * oh / ow).clamp(1, sh);
        CropRect {
            x: 0,
            y: ((sh - height) / 2) as u32,
            width: sw as u32,
            height: height as u32,
        }
    }
}

/// Draw everything onto a white canvas of [`Layout::canvas_size`].
pub fn compose_raster(
    source: &DynamicImage,
    qr: &GrayImage,
    logo: &RgbaImage,
    layout: &Layout,
) -> RgbaImage {
    let (width, height) = layout.canvas_size();
    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);

    let crop = center_crop(source.width(), source.height(), layout.width, layout.image_height);
    let fitted = source
        .crop_imm(crop.x, crop.y, crop.width, crop.height)
        .resize_exact(layout.width, layout.image_height, FilterType::Triangle)
        .to_rgba8();
    imageops::overlay(&mut canvas, &fitted, 0, i64::from(layout.margin));

    let (logo_x, logo_y) = layout.logo_origin();
    imageops::overlay(&mut canvas, logo, logo_x, logo_y);

    let qr = DynamicImage::ImageLuma8(qr.clone()).to_rgba8();
    let (qr_x, qr_y) = layout.qr_origin();
    imageops::overlay(&mut canvas, &qr, qr_x, qr_y);

    canvas
}

pub fn encode_png(image: &DynamicImage) -> ClientResult<Bytes> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(Bytes::from(buf))
}

/// Filled square with a hollow white frame in the middle.
fn default_logo(size: u32) -> RgbaImage {
    let frame = (size / 10).max(1);
    let (lo, hi) = (size / 4, size - size / 4);
    RgbaImage::from_fn(size, size, |x, y| {
        let in_outer = (lo..hi).contains(&x) && (lo..hi).contains(&y);
        let in_inner = (lo + frame..hi.saturating_sub(frame)).contains(&x)
            && (lo + frame..hi.saturating_sub(frame)).contains(&y);
        if in_outer && !in_inner { WHITE } else { MARK_FILL }
    })
}

/// Write to a temp file in `dir`, then rename into place.
async fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> ClientResult<PathBuf> {
    fs::create_dir_all(dir).await?;
    let final_path = dir.join(file_name);
    let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));

    if let Err(err) = fs::write(&tmp_path, bytes).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&tmp_path, &final_path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    Ok(final_path)
}
