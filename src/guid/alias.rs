//! Identity constants shared by client and library.
//!
//! Values are assigned once and never reused. Backward compatibility
//! depends on these staying stable, not on their particular value.
//! Layout: `75786775-69CC-4001-8000-0000000000NN` where `CC` is the
//! category and `NN` the index within it.

use super::InterfaceGuid;

macro_rules! aliases {
    ($( $category:literal => { $( $(#[$meta:meta])* $name:ident = $index:literal; )* } )*) => {
        $($(
            $(#[$meta])*
            #[doc = concat!("\n\nName: `", stringify!($name), "`.")]
            pub const $name: InterfaceGuid = InterfaceGuid::from_u128(
                0x7578_6775_6900_4001_8000_0000_0000_0000
                    | (($category as u128) << 80)
                    | ($index as u128),
            );
        )*)*

        /// Every named constant with its identifier, in declaration order.
        pub const ALL: &[(&str, InterfaceGuid)] = &[
            $($( (stringify!($name), $name), )*)*
        ];
    };
}

aliases! {
    0x00 => {
        /// Record format tag of a link table entry.
        LINK_TABLE_ENTRY = 0x01;
        /// Record format tag of a resource envelope.
        RESOURCE_ENVELOPE = 0x02;
    }
    0x01 => {
        /// Payload was created by the producer for this call only.
        CREATED_INTERNALLY_NOT_SHARED = 0x01;
        /// Payload is held externally and guarded by the caller's mutex.
        SHARED_RESOURCE = 0x02;
    }
    0x02 => {
        /// UTF-8 text payload.
        RAW_STRING = 0x01;
        /// Opaque byte payload.
        RAW_BYTES = 0x02;
    }
    0x10 => {
        FN_INPUT_RESOURCE = 0x01;
        FN_LINKED_MAPPED_OBJECTS_FIND_SIZE = 0x02;
        FN_LINKED_MAPPED_OBJECTS_FIND_STRING = 0x03;
        FN_SAVE = 0x04;
        FN_RESTORE = 0x05;
        FN_PUSH = 0x06;
        FN_POP = 0x07;
        FN_SCALE = 0x08;
        FN_TRANSFORM = 0x09;
        FN_MATRIX = 0x0a;
        FN_IDENTITY = 0x0b;
        FN_TRANSLATE = 0x0c;
        FN_ROTATE = 0x0d;
        FN_DEVICE = 0x0e;
        FN_DEVICE_DISTANCE = 0x0f;
        FN_DEVICE_OFFSET = 0x10;
        FN_DEVICE_SCALE = 0x11;
        FN_USER = 0x12;
        FN_USER_DISTANCE = 0x13;
        FN_NOTIFY_COMPLETE = 0x14;
    }
    0x20 => {
        PAINTER_BRUSH = 0x01;
        MATRIX = 0x02;
        ABSOLUTE_COORDINATE = 0x03;
        RELATIVE_COORDINATE = 0x04;
        COORDINATE = 0x05;
        IMAGE_BLOCK = 0x06;
        MASK = 0x07;
        FILL_PATH = 0x08;
        PAINT = 0x09;
        STROKE_FILL_PATH = 0x0a;
        STROKE_PATH = 0x0b;
        ANTIALIAS = 0x0c;
        GRAPHIC_OPERATOR = 0x0d;
        LINE_CAP = 0x0e;
        LINE_DASHES = 0x0f;
        LINE_JOIN = 0x10;
        LINE_WIDTH = 0x11;
        MITER_LIMIT = 0x12;
        TOLERANCE = 0x13;
        ARC = 0x14;
        CLOSE_PATH = 0x15;
        CURVE = 0x16;
        HLINE = 0x17;
        LINE = 0x18;
        NEGATIVE_ARC = 0x19;
        VLINE = 0x1a;
        RECTANGLE = 0x1b;
        SURFACE_AREA_BRUSH = 0x1c;
        SURFACE_AREA_TITLE = 0x1d;
        TEXT_ALIGNMENT = 0x1e;
        TEXT_COLOR = 0x1f;
        TEXT_ELLIPSIZE = 0x20;
        TEXT_FILL = 0x21;
        TEXT_FONT = 0x22;
        TEXT_INDENT = 0x23;
        TEXT_LINE_SPACE = 0x24;
        TEXT_RENDER_NORMAL = 0x25;
        TEXT_OUTLINE = 0x26;
        TEXT_RENDER_PATH = 0x27;
        TEXT_SHADOW = 0x28;
        TEXT_TAB_STOPS = 0x29;
    }
}

/// Look up the constant name of a known identity.
pub fn name_of(guid: &InterfaceGuid) -> Option<&'static str> {
    ALL.iter().find(|(_, g)| g == guid).map(|(name, _)| *name)
}
