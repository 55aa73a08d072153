//! Drawing-attribute value objects.
//!
//! These are plain data. Fixed-layout records are `#[repr(C)]`, start with
//! their identity and travel as raw bytes; variable-length ones encode
//! their payload when streamed. Records with brush behavior embed a
//! [`PainterBrush`] field.

use crate::error::Result;
use crate::guid::{InterfaceGuid, alias};
use crate::linkage::LibraryLinkage;
use crate::resource::{Ownership, ResourceEnvelope, StreamInput};
use crate::typed_index::{RawAttribute, TypedIndex};

/// A solid RGBA brush, components in `0.0..=1.0`.
///
/// A brush has no leading alias field. It only crosses the boundary
/// embedded in a record, which carries the identity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PainterBrush {
    /// Red component.
    pub red: f64,
    /// Green component.
    pub green: f64,
    /// Blue component.
    pub blue: f64,
    /// Alpha component.
    pub alpha: f64,
}

impl PainterBrush {
    /// Opaque black.
    pub const BLACK: PainterBrush = PainterBrush::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: PainterBrush = PainterBrush::rgb(1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: PainterBrush = PainterBrush::rgba(0.0, 0.0, 0.0, 0.0);

    /// An opaque color.
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// A color with alpha.
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Parse `0xRRGGBB` into an opaque color.
    pub fn from_rgb_hex(hex: u32) -> Self {
        let channel = |shift: u32| f64::from((hex >> shift) & 0xff) / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }
}

impl Default for PainterBrush {
    fn default() -> Self {
        Self::BLACK
    }
}

// Names the brush type; not a prefix of its bytes.
impl TypedIndex for PainterBrush {
    const ALIAS: InterfaceGuid = alias::PAINTER_BRUSH;
}

/// A 2D affine transform, `x' = xx·x + xy·y + x0`, `y' = yx·x + yy·y + y0`.
///
/// Passed by pointer to `transform` and `matrix`, whose capability GUID
/// identifies it. There is no leading alias field.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// xx component.
    pub xx: f64,
    /// yx component.
    pub yx: f64,
    /// xy component.
    pub xy: f64,
    /// yy component.
    pub yy: f64,
    /// x translation.
    pub x0: f64,
    /// y translation.
    pub y0: f64,
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Build from components.
    pub const fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }

    /// A translation.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A scale.
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation by `radians`.
    pub fn rotation(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// The transform that applies `self` first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            xx: self.xx * next.xx + self.yx * next.xy,
            yx: self.xx * next.yx + self.yx * next.yy,
            xy: self.xy * next.xx + self.yy * next.xy,
            yy: self.xy * next.yx + self.yy * next.yy,
            x0: self.x0 * next.xx + self.y0 * next.xy + next.x0,
            y0: self.x0 * next.yx + self.y0 * next.yy + next.y0,
        }
    }

    /// Transform a point.
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = self.transform_distance(x, y);
        (dx + self.x0, dy + self.y0)
    }

    /// Transform a distance (ignores translation).
    pub fn transform_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        (self.xx * dx + self.xy * dy, self.yx * dx + self.yy * dy)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// Names the matrix type; not a prefix of its bytes.
impl TypedIndex for Matrix {
    const ALIAS: InterfaceGuid = alias::MATRIX;
}

/// Content of an offscreen group started by `push`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// Color only.
    Color = 0x1000,
    /// Alpha only.
    Alpha = 0x2000,
    /// Color and alpha.
    #[default]
    ColorAlpha = 0x3000,
}

macro_rules! options {
    ($(
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident = $value:literal ),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[repr(u32)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $name {
                $(
                    #[allow(missing_docs)]
                    $variant = $value,
                )*
            }

            impl $name {
                /// Decode the raw value carried in a record.
                pub const fn from_raw(value: u32) -> Option<Self> {
                    match value {
                        $($value => Some(Self::$variant),)*
                        _ => None,
                    }
                }
            }
        )*
    };
}

options! {
    /// Antialiasing mode.
    AntialiasOption { Default = 0, None = 1, Gray = 2, Subpixel = 3, Fast = 4, Good = 5, Best = 6 }
    /// Compositing operator.
    GraphicOperatorOption {
        Clear = 0, Source = 1, Over = 2, In = 3, Out = 4, Atop = 5, Dest = 6, DestOver = 7,
        DestIn = 8, DestOut = 9, DestAtop = 10, Xor = 11, Add = 12, Saturate = 13,
        Multiply = 14, Screen = 15, Overlay = 16, Darken = 17, Lighten = 18, ColorDodge = 19,
        ColorBurn = 20, HardLight = 21, SoftLight = 22, Difference = 23, Exclusion = 24,
        HslHue = 25, HslSaturation = 26, HslColor = 27, HslLuminosity = 28,
    }
    /// Line end style.
    LineCapOption { Butt = 0, Round = 1, Square = 2 }
    /// Line corner style.
    LineJoinOption { Miter = 0, Round = 1, Bevel = 2 }
    /// Paragraph alignment.
    TextAlignmentOption { Left = 0, Center = 1, Right = 2, Justified = 3 }
    /// Where text is shortened when it does not fit.
    TextEllipsizeOption { Off = 0, Start = 1, Middle = 2, End = 3 }
}

fn stream_raw<T: RawAttribute>(value: &T, linkage: &LibraryLinkage) -> Result<()> {
    linkage.input_resource(&ResourceEnvelope::attribute(value))
}

macro_rules! raw_attributes {
    ($(
        $(#[$meta:meta])*
        $name:ident = $alias:path { $( $field:ident : $ty:ty ),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            #[derive(Debug, Clone, Copy, PartialEq)]
            pub struct $name {
                alias: InterfaceGuid,
                $(
                    #[allow(missing_docs)]
                    pub $field: $ty,
                )*
            }

            impl $name {
                /// Build the record.
                #[allow(clippy::new_without_default, clippy::too_many_arguments)]
                pub const fn new($($field: $ty),*) -> Self {
                    Self { alias: $alias, $($field),* }
                }
            }

            impl TypedIndex for $name {
                const ALIAS: InterfaceGuid = $alias;
            }

            // SAFETY: `#[repr(C)]`, identity first, and every remaining field
            // is `f64`, `u32` or `PainterBrush`, which pack without padding
            // after the 16-byte identity and accept any bit pattern.
            unsafe impl RawAttribute for $name {}

            impl StreamInput for $name {
                fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
                    stream_raw(self, linkage)
                }
            }
        )*
    };
}

raw_attributes! {
    /// Following coordinates are absolute.
    AbsoluteCoordinate = alias::ABSOLUTE_COORDINATE {}
    /// Following coordinates are relative to the current point.
    RelativeCoordinate = alias::RELATIVE_COORDINATE {}
    /// Position and extent of following content.
    Coordinate = alias::COORDINATE { x: f64, y: f64, w: f64, h: f64 }
    /// Mask with a brush.
    Mask = alias::MASK { brush: PainterBrush }
    /// Fill the current path.
    FillPath = alias::FILL_PATH { brush: PainterBrush }
    /// Paint the whole clip region.
    Paint = alias::PAINT { alpha: f64 }
    /// Fill then stroke the current path.
    StrokeFillPath = alias::STROKE_FILL_PATH { fill: PainterBrush, stroke: PainterBrush }
    /// Stroke the current path.
    StrokePath = alias::STROKE_PATH { brush: PainterBrush }
    /// Line width in user units.
    LineWidth = alias::LINE_WIDTH { value: f64 }
    /// Miter limit.
    MiterLimit = alias::MITER_LIMIT { value: f64 }
    /// Curve flattening tolerance.
    Tolerance = alias::TOLERANCE { value: f64 }
    /// Arc, counter-clockwise.
    Arc = alias::ARC { xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64 }
    /// Close the current sub-path.
    ClosePath = alias::CLOSE_PATH {}
    /// Cubic Bézier curve.
    Curve = alias::CURVE { x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64 }
    /// Horizontal line to `value`.
    HLine = alias::HLINE { value: f64 }
    /// Line to a point.
    Line = alias::LINE { x: f64, y: f64 }
    /// Arc, clockwise.
    NegativeArc = alias::NEGATIVE_ARC { xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64 }
    /// Vertical line to `value`.
    VLine = alias::VLINE { value: f64 }
    /// Axis-aligned rectangle.
    Rectangle = alias::RECTANGLE { x: f64, y: f64, width: f64, height: f64 }
    /// Background brush of the surface.
    SurfaceAreaBrush = alias::SURFACE_AREA_BRUSH { brush: PainterBrush }
    /// Text color.
    TextColor = alias::TEXT_COLOR { brush: PainterBrush }
    /// Text fill brush.
    TextFill = alias::TEXT_FILL { brush: PainterBrush }
    /// First-line indent.
    TextIndent = alias::TEXT_INDENT { value: f64 }
    /// Extra space between lines.
    TextLineSpace = alias::TEXT_LINE_SPACE { value: f64 }
    /// Render text as glyphs.
    TextRenderNormal = alias::TEXT_RENDER_NORMAL {}
    /// Text outline brush.
    TextOutline = alias::TEXT_OUTLINE { brush: PainterBrush }
    /// Render text as a path.
    TextRenderPath = alias::TEXT_RENDER_PATH {}
    /// Text shadow brush.
    TextShadow = alias::TEXT_SHADOW { brush: PainterBrush }
    /// Antialiasing mode, see [`AntialiasOption`].
    Antialias = alias::ANTIALIAS { value: u32 }
    /// Compositing operator, see [`GraphicOperatorOption`].
    GraphicOperator = alias::GRAPHIC_OPERATOR { value: u32 }
    /// Line end style, see [`LineCapOption`].
    LineCap = alias::LINE_CAP { value: u32 }
    /// Line corner style, see [`LineJoinOption`].
    LineJoin = alias::LINE_JOIN { value: u32 }
    /// Paragraph alignment, see [`TextAlignmentOption`].
    TextAlignment = alias::TEXT_ALIGNMENT { value: u32 }
    /// Ellipsize mode, see [`TextEllipsizeOption`].
    TextEllipsize = alias::TEXT_ELLIPSIZE { value: u32 }
}

macro_rules! option_accessors {
    ($($record:ident => $option:ident),* $(,)?) => {
        $(
            impl $record {
                /// Build the record from its option.
                pub const fn with(option: $option) -> Self {
                    Self::new(option as u32)
                }

                /// The option, if the raw value is one this crate knows.
                pub const fn option(&self) -> Option<$option> {
                    $option::from_raw(self.value)
                }
            }
        )*
    };
}

option_accessors! {
    Antialias => AntialiasOption,
    GraphicOperator => GraphicOperatorOption,
    LineCap => LineCapOption,
    LineJoin => LineJoinOption,
    TextAlignment => TextAlignmentOption,
    TextEllipsize => TextEllipsizeOption,
}

fn f64_payload(values: impl IntoIterator<Item = f64>) -> Vec<u8> {
    values.into_iter().flat_map(f64::to_ne_bytes).collect()
}

/// Dash pattern. Streams as native-endian `f64`s: offset, then dashes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineDashes {
    /// On/off lengths.
    pub value: Vec<f64>,
    /// Offset into the pattern.
    pub offset: f64,
}

impl LineDashes {
    /// Build a dash pattern.
    pub fn new(value: Vec<f64>, offset: f64) -> Self {
        Self { value, offset }
    }
}

impl TypedIndex for LineDashes {
    const ALIAS: InterfaceGuid = alias::LINE_DASHES;
}

impl StreamInput for LineDashes {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        let payload = f64_payload(std::iter::once(self.offset).chain(self.value.iter().copied()));
        linkage.input_resource(&ResourceEnvelope::new(Self::ALIAS, Ownership::Transient, &payload))
    }
}

/// Tab stop positions. Streams as native-endian `f64`s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextTabStops {
    /// Stop positions.
    pub value: Vec<f64>,
}

impl TypedIndex for TextTabStops {
    const ALIAS: InterfaceGuid = alias::TEXT_TAB_STOPS;
}

impl StreamInput for TextTabStops {
    fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
        let payload = f64_payload(self.value.iter().copied());
        linkage.input_resource(&ResourceEnvelope::new(Self::ALIAS, Ownership::Transient, &payload))
    }
}

macro_rules! text_attributes {
    ($( $(#[$meta:meta])* $name:ident = $alias:path { $field:ident } )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Default)]
            pub struct $name {
                #[allow(missing_docs)]
                pub $field: String,
            }

            impl $name {
                /// Build the attribute.
                pub fn new($field: impl Into<String>) -> Self {
                    Self { $field: $field.into() }
                }
            }

            impl TypedIndex for $name {
                const ALIAS: InterfaceGuid = $alias;
            }

            impl StreamInput for $name {
                fn stream_into(&self, linkage: &LibraryLinkage) -> Result<()> {
                    let envelope = ResourceEnvelope::new(
                        Self::ALIAS,
                        Ownership::Transient,
                        self.$field.as_bytes(),
                    );
                    linkage.input_resource(&envelope)
                }
            }
        )*
    };
}

text_attributes! {
    /// Font description, e.g. `"Sans Bold 12"`.
    TextFont = alias::TEXT_FONT { description }
    /// Window title.
    SurfaceAreaTitle = alias::SURFACE_AREA_TITLE { value }
    /// Image reference by description.
    ImageBlock = alias::IMAGE_BLOCK { description }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use std::mem::size_of;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_record_sizes_have_no_padding() {
        assert_eq!(size_of::<ClosePath>(), 16);
        assert_eq!(size_of::<LineWidth>(), 16 + 8);
        assert_eq!(size_of::<LineCap>(), 16 + 4);
        assert_eq!(size_of::<StrokeFillPath>(), 16 + 64);
        assert_eq!(size_of::<Curve>(), 16 + 48);
    }

    #[test]
    fn test_value_types_have_no_alias_field() {
        assert_eq!(size_of::<PainterBrush>(), 32);
        assert_eq!(size_of::<Matrix>(), 48);
        assert_eq!(PainterBrush::ALIAS, alias::PAINTER_BRUSH);
        assert_eq!(Matrix::ALIAS, alias::MATRIX);
        assert_eq!(size_of::<Mask>(), 16 + size_of::<PainterBrush>());
    }

    #[test]
    fn test_records_carry_alias() {
        assert_eq!(Mask::new(PainterBrush::WHITE).alias(), alias::MASK);
        assert_eq!(TextFont::new("Sans 12").alias(), alias::TEXT_FONT);
    }

    #[test]
    fn test_option_accessors() {
        let cap = LineCap::with(LineCapOption::Round);
        assert_eq!(cap.value, 1);
        assert_eq!(cap.option(), Some(LineCapOption::Round));
        assert_eq!(LineJoin::new(99).option(), None);
        assert_eq!(
            GraphicOperator::with(GraphicOperatorOption::HslLuminosity).option(),
            Some(GraphicOperatorOption::HslLuminosity)
        );
    }

    #[test]
    fn test_brush_from_hex() {
        let brush = PainterBrush::from_rgb_hex(0xff0080);
        assert_eq!(brush.red, 1.0);
        assert_eq!(brush.green, 0.0);
        assert!((brush.blue - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(brush.alpha, 1.0);
    }

    #[test]
    fn test_matrix_composition() {
        let m = Matrix::scaling(2.0, 3.0).then(&Matrix::translation(10.0, 20.0));
        assert!(close(m.transform_point(1.0, 1.0), (12.0, 23.0)));
        assert!(close(m.transform_distance(1.0, 1.0), (2.0, 3.0)));

        let r = Matrix::rotation(FRAC_PI_2);
        assert!(close(r.transform_point(1.0, 0.0), (0.0, 1.0)));

        assert_eq!(Matrix::IDENTITY.then(&m), m);
    }

    #[test]
    fn test_dash_payload_layout() {
        let bytes = f64_payload([0.5, 4.0, 2.0]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], &0.5f64.to_ne_bytes());
    }
}
