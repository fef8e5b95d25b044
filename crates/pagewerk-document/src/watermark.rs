// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark: stamp text or an image on top of selected pages.
//
// Each selected page gains one overlay drawn after its own content. Text
// uses the standard Helvetica font and opacity comes from an ExtGState, so
// nothing needs embedding. Images are decoded once and shared by every
// page that shows them.

use std::sync::Arc;

use lopdf::content::Operation;
use lopdf::{Dictionary, Object, Stream, StringFormat};
use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::job::JobControl;
use pagewerk_core::types::{Rect, RgbColor, clamp_unit};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::model::{
    Document, Overlay, OverlayKind, OverlayResource, Page, ResourceCategory, ResourceObject,
};
use crate::pdf::content::GLYPH_WIDTH_EM;
use crate::selector::PageSelector;

/// Cap height of Helvetica, used to centre text vertically.
const CAP_HEIGHT_EM: f32 = 0.72;
/// Images are scaled to fit within this fraction of the page.
const IMAGE_PAGE_FRACTION: f32 = 0.4;
const DEFAULT_OPACITY: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatermarkPayload {
    Text {
        content: String,
        /// Points; `None` uses the configured default.
        font_size: Option<f32>,
        color: RgbColor,
        opacity: f32,
    },
    Image {
        /// PNG or JPEG.
        #[serde(skip)]
        bytes: Vec<u8>,
        opacity: f32,
    },
}

impl WatermarkPayload {
    /// Grey text at 30% opacity in the default size.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            font_size: None,
            color: RgbColor::GRAY,
            opacity: DEFAULT_OPACITY,
        }
    }

    pub fn image(bytes: Vec<u8>) -> Self {
        Self::Image {
            bytes,
            opacity: DEFAULT_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    /// Centred, rotated along the page diagonal.
    #[default]
    Diagonal,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    /// Counter-clockwise degrees. Overrides the diagonal angle.
    pub rotation_degrees: Option<f32>,
}

impl Placement {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            rotation_degrees: None,
        }
    }
}

pub fn watermark(
    doc: &Document,
    payload: &WatermarkPayload,
    placement: &Placement,
    selector: &PageSelector,
) -> Result<Document> {
    watermark_with(
        doc,
        payload,
        placement,
        selector,
        &EngineConfig::default(),
        &JobControl::new(),
    )
}

#[instrument(skip_all, fields(pages = doc.page_count(), position = ?placement.position))]
pub fn watermark_with(
    doc: &Document,
    payload: &WatermarkPayload,
    placement: &Placement,
    selector: &PageSelector,
    config: &EngineConfig,
    job: &JobControl,
) -> Result<Document> {
    let stamp = Stamp::prepare(payload, config)?;
    let selected = selector.resolve(doc.page_count())?;

    let mut out = doc.clone();
    job.report(0, selected.len());
    for (done, &index) in selected.iter().enumerate() {
        job.checkpoint()?;
        let page = &mut out.pages[index];
        let number = free_number(page);
        let overlay = stamp.overlay(page.media_box(), placement, config, number);
        page.push_overlay(overlay);
        job.report(done + 1, selected.len());
    }

    info!(pages = selected.len(), "watermark applied");
    Ok(out)
}

/// A payload validated and converted to PDF objects, ready to place.
enum Stamp {
    Text {
        bytes: Vec<u8>,
        font_size: f32,
        color: RgbColor,
        opacity: f32,
    },
    Image {
        image: Arc<Stream>,
        smask: Option<Arc<Stream>>,
        width: f32,
        height: f32,
        opacity: f32,
    },
}

impl Stamp {
    fn prepare(payload: &WatermarkPayload, config: &EngineConfig) -> Result<Self> {
        match payload {
            WatermarkPayload::Text {
                content,
                font_size,
                color,
                opacity,
            } => {
                if content.trim().is_empty() {
                    return Err(PagewerkError::InvalidOption(
                        "watermark text is empty".into(),
                    ));
                }
                let font_size = font_size
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .unwrap_or(config.watermark_font_size);
                Ok(Self::Text {
                    bytes: win_ansi(content),
                    font_size,
                    color: *color,
                    opacity: clamp_unit(*opacity),
                })
            }
            WatermarkPayload::Image { bytes, opacity } => {
                if bytes.is_empty() {
                    return Err(PagewerkError::InvalidOption(
                        "watermark image is empty".into(),
                    ));
                }
                let decoded = image::load_from_memory(bytes)
                    .map_err(|err| PagewerkError::ImageError(err.to_string()))?;
                let rgba = decoded.to_rgba8();
                let (width, height) = rgba.dimensions();
                debug!(width, height, "watermark image decoded");

                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                let smask = alpha
                    .iter()
                    .any(|&a| a < u8::MAX)
                    .then(|| Arc::new(image_stream(width, height, b"DeviceGray", alpha)));

                Ok(Self::Image {
                    image: Arc::new(image_stream(width, height, b"DeviceRGB", rgb)),
                    smask,
                    width: width as f32,
                    height: height as f32,
                    opacity: clamp_unit(*opacity),
                })
            }
        }
    }

    /// The overlay for one page, with resource names built from `number`.
    fn overlay(&self, media: Rect, placement: &Placement, config: &EngineConfig, number: usize) -> Overlay {
        let gs_name = resource_name(number, ResourceCategory::ExtGState);
        let (opacity, mut resources, body, (w, h)) = match self {
            Self::Text {
                bytes,
                font_size,
                color,
                opacity,
            } => {
                let font_name = resource_name(number, ResourceCategory::Font);
                let width = GLYPH_WIDTH_EM * font_size * bytes.len() as f32;
                let height = CAP_HEIGHT_EM * font_size;
                let resources = vec![OverlayResource {
                    category: ResourceCategory::Font,
                    name: font_name.clone(),
                    object: ResourceObject::Direct(Dictionary::from_iter([
                        ("Type", Object::Name(b"Font".to_vec())),
                        ("Subtype", Object::Name(b"Type1".to_vec())),
                        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
                        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
                    ])),
                }];
                let body = Body::Text {
                    font_name,
                    bytes: bytes.clone(),
                    font_size: *font_size,
                    color: *color,
                };
                (*opacity, resources, body, (width, height))
            }
            Self::Image {
                image,
                smask,
                width,
                height,
                opacity,
            } => {
                let image_name = resource_name(number, ResourceCategory::XObject);
                let scale = (media.width * IMAGE_PAGE_FRACTION / width)
                    .min(media.height * IMAGE_PAGE_FRACTION / height);
                let resources = vec![OverlayResource {
                    category: ResourceCategory::XObject,
                    name: image_name.clone(),
                    object: ResourceObject::Image {
                        image: Arc::clone(image),
                        smask: smask.clone(),
                    },
                }];
                (
                    *opacity,
                    resources,
                    Body::Image { image_name },
                    (width * scale, height * scale),
                )
            }
        };

        resources.push(OverlayResource {
            category: ResourceCategory::ExtGState,
            name: gs_name.clone(),
            object: ResourceObject::Direct(Dictionary::from_iter([
                ("Type", Object::Name(b"ExtGState".to_vec())),
                ("ca", Object::Real(opacity)),
                ("CA", Object::Real(opacity)),
            ])),
        });

        let angle = placement
            .rotation_degrees
            .unwrap_or(match placement.position {
                Position::Diagonal => media.height.atan2(media.width).to_degrees(),
                _ => 0.0,
            })
            .to_radians();
        let matrix = place(media, placement.position, config.watermark_margin_pt, w, h, angle);

        let mut operations = vec![Operation::new("gs", vec![Object::Name(gs_name.into_bytes())])];
        operations.extend(body.operations(matrix, w, h));
        Overlay {
            kind: OverlayKind::Watermark,
            operations,
            resources,
        }
    }
}

enum Body {
    Text {
        font_name: String,
        bytes: Vec<u8>,
        font_size: f32,
        color: RgbColor,
    },
    Image {
        image_name: String,
    },
}

impl Body {
    /// `matrix` maps the unrotated `w × h` box at the origin onto the page.
    fn operations(self, matrix: [f32; 6], w: f32, h: f32) -> Vec<Operation> {
        let reals = |values: &[f32]| values.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>();
        match self {
            Self::Text {
                font_name,
                bytes,
                font_size,
                color,
            } => vec![
                Operation::new("rg", reals(&[color.r, color.g, color.b])),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(font_name.into_bytes()), Object::Real(font_size)],
                ),
                Operation::new("Tm", reals(&matrix)),
                Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
                Operation::new("ET", vec![]),
            ],
            Self::Image { image_name } => {
                let [a, b, c, d, e, f] = matrix;
                vec![
                    Operation::new("cm", reals(&[a * w, b * w, c * h, d * h, e, f])),
                    Operation::new("Do", vec![Object::Name(image_name.into_bytes())]),
                ]
            }
        }
    }
}

/// Matrix placing a `w × h` box rotated by `angle` radians at `position`.
///
/// Corner positions keep the rotated box's extent inside the margin; centre
/// positions put the box centre on the page centre.
fn place(media: Rect, position: Position, margin: f32, w: f32, h: f32, angle: f32) -> [f32; 6] {
    let (sin, cos) = angle.sin_cos();
    let extent_w = (w * cos).abs() + (h * sin).abs();
    let extent_h = (w * sin).abs() + (h * cos).abs();

    let (cx, cy) = match position {
        Position::Center | Position::Diagonal => media.center(),
        Position::TopLeft => (
            media.x + margin + extent_w / 2.0,
            media.top() - margin - extent_h / 2.0,
        ),
        Position::TopRight => (
            media.right() - margin - extent_w / 2.0,
            media.top() - margin - extent_h / 2.0,
        ),
        Position::BottomLeft => (
            media.x + margin + extent_w / 2.0,
            media.y + margin + extent_h / 2.0,
        ),
        Position::BottomRight => (
            media.right() - margin - extent_w / 2.0,
            media.y + margin + extent_h / 2.0,
        ),
    };

    // Origin such that the box centre lands on (cx, cy) after rotation.
    let ox = cx - (w / 2.0 * cos - h / 2.0 * sin);
    let oy = cy - (w / 2.0 * sin + h / 2.0 * cos);
    [cos, sin, -sin, cos, ox, oy]
}

fn resource_name(number: usize, category: ResourceCategory) -> String {
    let suffix = match category {
        ResourceCategory::Font => "F",
        ResourceCategory::ExtGState => "Gs",
        ResourceCategory::XObject => "Im",
    };
    format!("PgwWm{number}{suffix}")
}

/// Lowest overlay number none of whose names is taken on `page`. Pages read
/// back from an earlier run carry their old watermark names in their own
/// resources, so counting overlays alone is not enough.
fn free_number(page: &Page) -> usize {
    const CATEGORIES: [ResourceCategory; 3] = [
        ResourceCategory::Font,
        ResourceCategory::ExtGState,
        ResourceCategory::XObject,
    ];
    let mut number = page.overlays().len();
    while CATEGORIES
        .iter()
        .any(|&category| page.has_resource(category, &resource_name(number, category)))
    {
        number += 1;
    }
    number
}

/// Encode for WinAnsiEncoding; characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn image_stream(width: u32, height: u32, color_space: &[u8], data: Vec<u8>) -> Stream {
    let dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);
    Stream::new(dict, data)
}
