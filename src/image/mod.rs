//! Image URL builder
//!
//! Resolves a Sanity image reference into a CDN URL. When both a width and
//! a height are requested, the image is cropped to that aspect ratio around
//! its hotspot, staying inside the editor's crop, and the region is sent as
//! a `rect` parameter.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::client::ClientIdentity;

/// Image CDN host
pub const CDN_URL: &str = "https://cdn.sanity.io";

lazy_static! {
    static ref ASSET_ID: Regex = Regex::new(r"^image-([^-]+)-(\d+)x(\d+)-([^-]+)$").unwrap();
}

/// Errors raised while turning a reference into a URL
#[derive(Error, Debug, PartialEq)]
pub enum ImageUrlError {
    #[error("unable to resolve image source: {0}")]
    InvalidSource(String),

    #[error("malformed asset id: {0}")]
    InvalidAssetId(String),
}

/// Entry point: binds a store identity, hands out per-image builders
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: Option<String>,
    dataset: Option<String>,
}

impl ImageUrlBuilder {
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            project_id: identity.project_id,
            dataset: identity.dataset,
        }
    }

    /// Builder for one image; `None` when the store identity is incomplete
    /// or there is no source to resolve
    pub fn image(&self, source: &Value) -> Option<ImageUrl> {
        let project_id = self.project_id.as_ref()?;
        let dataset = self.dataset.as_ref()?;
        if source.is_null() {
            return None;
        }
        Some(ImageUrl {
            project_id: project_id.clone(),
            dataset: dataset.clone(),
            source: source.clone(),
            width: None,
            height: None,
        })
    }
}

/// A single image with requested output size
#[derive(Debug, Clone)]
pub struct ImageUrl {
    project_id: String,
    dataset: String,
    source: Value,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImageUrl {
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Final CDN URL
    pub fn url(&self) -> Result<String, ImageUrlError> {
        let source = ImageSource::parse(&self.source)?;
        let asset = Asset::parse(&source.asset_ref)?;

        let rect = match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => {
                fit(&source.crop_rect(&asset), &source.hotspot_box(&asset), w, h)
            }
            _ => source.crop_rect(&asset),
        };

        let mut url = format!(
            "{}/images/{}/{}/{}-{}x{}.{}",
            CDN_URL, self.project_id, self.dataset, asset.id, asset.width, asset.height, asset.format
        );

        let mut params = Vec::new();
        if rect.differs_from_full(&asset) {
            params.push(format!(
                "rect={},{},{},{}",
                rect.left, rect.top, rect.width, rect.height
            ));
        }
        if let Some(w) = self.width {
            params.push(format!("w={}", w));
        }
        if let Some(h) = self.height {
            params.push(format!("h={}", h));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        Ok(url)
    }
}

/// Parsed `image-<id>-<W>x<H>-<format>` asset id
#[derive(Debug, PartialEq)]
struct Asset {
    id: String,
    width: i64,
    height: i64,
    format: String,
}

impl Asset {
    fn parse(asset_ref: &str) -> Result<Self, ImageUrlError> {
        let caps = ASSET_ID
            .captures(asset_ref)
            .ok_or_else(|| ImageUrlError::InvalidAssetId(asset_ref.to_string()))?;
        let dimension = |i: usize| {
            caps[i]
                .parse::<i64>()
                .map_err(|_| ImageUrlError::InvalidAssetId(asset_ref.to_string()))
        };
        Ok(Self {
            id: caps[1].to_string(),
            width: dimension(2)?,
            height: dimension(3)?,
            format: caps[4].to_string(),
        })
    }
}

/// Crop insets, as fractions of each side
#[derive(Debug, Clone, Copy, PartialEq)]
struct Crop {
    top: f64,
    bottom: f64,
    left: f64,
    right: f64,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            top: 0.0,
            bottom: 0.0,
            left: 0.0,
            right: 0.0,
        }
    }
}

/// Focus area, centre and size as fractions of the image
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hotspot {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Default for Hotspot {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Pixel region of the source image
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    left: i64,
    top: i64,
    width: i64,
    height: i64,
}

impl Rect {
    fn differs_from_full(&self, asset: &Asset) -> bool {
        self.left != 0 || self.top != 0 || self.width != asset.width || self.height != asset.height
    }
}

/// Hotspot bounds in pixels
#[derive(Debug, Clone, Copy)]
struct HotspotBox {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

#[derive(Debug)]
struct ImageSource {
    asset_ref: String,
    crop: Crop,
    hotspot: Hotspot,
}

impl ImageSource {
    /// Accepts an asset id, a CDN URL, `{_ref}`, `{_id}` or `{asset: {...}}`
    fn parse(value: &Value) -> Result<Self, ImageUrlError> {
        let asset_ref = match value {
            Value::String(s) => ref_from_str(s),
            Value::Object(map) => match map.get("asset") {
                Some(asset) => ref_from_object(asset),
                None => ref_from_object(value),
            },
            _ => None,
        }
        .ok_or_else(|| ImageUrlError::InvalidSource(value.to_string()))?;

        let crop = value
            .get("crop")
            .map(|c| {
                let d = Crop::default();
                Crop {
                    top: number(c, "top").unwrap_or(d.top),
                    bottom: number(c, "bottom").unwrap_or(d.bottom),
                    left: number(c, "left").unwrap_or(d.left),
                    right: number(c, "right").unwrap_or(d.right),
                }
            })
            .unwrap_or_default();
        let hotspot = value
            .get("hotspot")
            .map(|h| {
                let d = Hotspot::default();
                Hotspot {
                    x: number(h, "x").unwrap_or(d.x),
                    y: number(h, "y").unwrap_or(d.y),
                    width: number(h, "width").unwrap_or(d.width),
                    height: number(h, "height").unwrap_or(d.height),
                }
            })
            .unwrap_or_default();

        Ok(Self {
            asset_ref,
            crop,
            hotspot,
        })
    }

    fn crop_rect(&self, asset: &Asset) -> Rect {
        let (w, h) = (asset.width as f64, asset.height as f64);
        let left = js_round(self.crop.left * w);
        let top = js_round(self.crop.top * h);
        Rect {
            left: left as i64,
            top: top as i64,
            width: js_round(w - self.crop.right * w - left) as i64,
            height: js_round(h - self.crop.bottom * h - top) as i64,
        }
    }

    fn hotspot_box(&self, asset: &Asset) -> HotspotBox {
        let (w, h) = (asset.width as f64, asset.height as f64);
        let (cx, cy) = (self.hotspot.x * w, self.hotspot.y * h);
        let (rx, ry) = (self.hotspot.width * w / 2.0, self.hotspot.height * h / 2.0);
        HotspotBox {
            left: cx - rx,
            top: cy - ry,
            right: cx + rx,
            bottom: cy + ry,
        }
    }
}

/// Largest region of the target aspect ratio inside `crop`, centred on the hotspot
fn fit(crop: &Rect, hotspot: &HotspotBox, width: u32, height: u32) -> Rect {
    let desired = width as f64 / height as f64;
    let crop_ratio = crop.width as f64 / crop.height as f64;

    if crop_ratio > desired {
        // Crop is wider than the target: keep full height, slide horizontally
        let height = crop.height;
        let width = js_round(height as f64 * desired) as i64;
        let top = crop.top.max(0);
        let centre = js_round((hotspot.right - hotspot.left) / 2.0 + hotspot.left);
        let mut left = (js_round(centre - width as f64 / 2.0) as i64).max(0);
        if left < crop.left {
            left = crop.left;
        } else if left + width > crop.left + crop.width {
            left = crop.left + crop.width - width;
        }
        Rect {
            left,
            top,
            width,
            height,
        }
    } else {
        // Crop is taller than the target: keep full width, slide vertically
        let width = crop.width;
        let height = js_round(width as f64 / desired) as i64;
        let left = crop.left.max(0);
        let centre = js_round((hotspot.bottom - hotspot.top) / 2.0 + hotspot.top);
        let mut top = (js_round(centre - height as f64 / 2.0) as i64).max(0);
        if top < crop.top {
            top = crop.top;
        } else if top + height > crop.top + crop.height {
            top = crop.top + crop.height - height;
        }
        Rect {
            left,
            top,
            width,
            height,
        }
    }
}

/// Round half up, matching the URL builder the CDN documents
fn js_round(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn ref_from_object(value: &Value) -> Option<String> {
    ["_ref", "_id"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| value.get("url").and_then(Value::as_str).and_then(ref_from_url))
}

fn ref_from_str(s: &str) -> Option<String> {
    if s.starts_with("http://") || s.starts_with("https://") {
        ref_from_url(s)
    } else {
        Some(s.to_string())
    }
}

/// `https://cdn.sanity.io/images/p/d/abc-10x20.png?w=1` -> `image-abc-10x20-png`
fn ref_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    let (name, ext) = file.rsplit_once('.')?;
    Some(format!("image-{}-{}", name, ext))
}
