//! Wire values for camera settings.
//!
//! Each setting travels as a single raw byte. The newtypes below keep that
//! byte intact (any value converts in and back out unchanged) while naming
//! the values camera modules document. Whether a value is actually supported
//! is for the camera to decide.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! wire_value {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$cmeta:meta])* $konst:ident = $val:literal => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            $($(#[$cmeta])* pub const $konst: Self = Self($val);)*

            /// Human-readable name, or `"UNKNOWN"` for undocumented values.
            pub fn name(self) -> &'static str {
                match self.0 {
                    $($val => $label,)*
                    _ => "UNKNOWN",
                }
            }

            /// Whether this is one of the documented values.
            pub fn is_known(self) -> bool {
                matches!(self.0, $($val)|*)
            }

            /// Look a value up by its name (case-insensitive).
            pub fn from_name(name: &str) -> Option<Self> {
                match name.to_ascii_uppercase().as_str() {
                    $($label => Some(Self::$konst),)*
                    _ => None,
                }
            }
        }

        impl From<u8> for $name {
            fn from(raw: u8) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} (0x{:02X})", self.name(), self.0)
            }
        }
    };
}

wire_value! {
    /// Capture resolution (picture mode / video mode).
    Resolution {
        QQVGA = 0x00 => "QQVGA",
        QVGA = 0x01 => "QVGA",
        VGA = 0x02 => "VGA",
        SVGA = 0x03 => "SVGA",
        HD = 0x04 => "HD",
        SXGAM = 0x05 => "SXGAM",
        UXGA = 0x06 => "UXGA",
        FHD = 0x07 => "FHD",
        QXGA = 0x08 => "QXGA",
        WQXGA2 = 0x09 => "WQXGA2",
        R96X96 = 0x0A => "96X96",
        R128X128 = 0x0B => "128X128",
        R320X320 = 0x0C => "320X320",
    }
}

impl Resolution {
    /// Frame size in pixels for documented resolutions.
    pub fn dimensions(self) -> Option<(u32, u32)> {
        let dims = match self {
            Self::QQVGA => (160, 120),
            Self::QVGA => (320, 240),
            Self::VGA => (640, 480),
            Self::SVGA => (800, 600),
            Self::HD => (1280, 720),
            Self::SXGAM => (1280, 960),
            Self::UXGA => (1600, 1200),
            Self::FHD => (1920, 1080),
            Self::QXGA => (2048, 1536),
            Self::WQXGA2 => (2592, 1944),
            Self::R96X96 => (96, 96),
            Self::R128X128 => (128, 128),
            Self::R320X320 => (320, 320),
            _ => return None,
        };
        Some(dims)
    }
}

wire_value! {
    /// Output pixel format of a capture.
    PixelFormat {
        JPEG = 0x01 => "JPEG",
        RGB565 = 0x02 => "RGB565",
        YUV = 0x03 => "YUV",
    }
}

wire_value! {
    BrightnessLevel {
        DEFAULT = 0 => "DEFAULT",
        PLUS_1 = 1 => "+1",
        MINUS_1 = 2 => "-1",
        PLUS_2 = 3 => "+2",
        MINUS_2 = 4 => "-2",
        PLUS_3 = 5 => "+3",
        MINUS_3 = 6 => "-3",
        PLUS_4 = 7 => "+4",
        MINUS_4 = 8 => "-4",
    }
}

wire_value! {
    ContrastLevel {
        DEFAULT = 0 => "DEFAULT",
        PLUS_1 = 1 => "+1",
        MINUS_1 = 2 => "-1",
        PLUS_2 = 3 => "+2",
        MINUS_2 = 4 => "-2",
        PLUS_3 = 5 => "+3",
        MINUS_3 = 6 => "-3",
    }
}

wire_value! {
    SaturationLevel {
        DEFAULT = 0 => "DEFAULT",
        PLUS_1 = 1 => "+1",
        MINUS_1 = 2 => "-1",
        PLUS_2 = 3 => "+2",
        MINUS_2 = 4 => "-2",
        PLUS_3 = 5 => "+3",
        MINUS_3 = 6 => "-3",
    }
}

wire_value! {
    /// Exposure compensation.
    EvLevel {
        DEFAULT = 0 => "DEFAULT",
        PLUS_1 = 1 => "+1",
        MINUS_1 = 2 => "-1",
        PLUS_2 = 3 => "+2",
        MINUS_2 = 4 => "-2",
        PLUS_3 = 5 => "+3",
        MINUS_3 = 6 => "-3",
    }
}

wire_value! {
    SharpnessLevel {
        AUTO = 0 => "AUTO",
        LEVEL_1 = 1 => "LEVEL_1",
        LEVEL_2 = 2 => "LEVEL_2",
        LEVEL_3 = 3 => "LEVEL_3",
        LEVEL_4 = 4 => "LEVEL_4",
        LEVEL_5 = 5 => "LEVEL_5",
        LEVEL_6 = 6 => "LEVEL_6",
        LEVEL_7 = 7 => "LEVEL_7",
        LEVEL_8 = 8 => "LEVEL_8",
    }
}

wire_value! {
    /// JPEG compression quality.
    ImageQuality {
        HIGH = 0 => "HIGH",
        DEFAULT = 1 => "DEFAULT",
        LOW = 2 => "LOW",
    }
}

wire_value! {
    /// Manual white balance preset.
    WhiteBalanceMode {
        AUTO = 0 => "AUTO",
        SUNNY = 1 => "SUNNY",
        OFFICE = 2 => "OFFICE",
        CLOUDY = 3 => "CLOUDY",
        HOME = 4 => "HOME",
    }
}

wire_value! {
    /// Special color effect.
    ColorEffect {
        NONE = 0 => "NONE",
        BLUEISH = 1 => "BLUEISH",
        REDISH = 2 => "REDISH",
        BW = 3 => "BW",
        SEPIA = 4 => "SEPIA",
        NEGATIVE = 5 => "NEGATIVE",
        GRASS_GREEN = 6 => "GRASS_GREEN",
        OVER_EXPOSURE = 7 => "OVER_EXPOSURE",
        SOLARIZE = 8 => "SOLARIZE",
    }
}

wire_value! {
    /// Auto focus control code.
    FocusControl {
        DISABLE = 0x00 => "DISABLE",
        CONTINUOUS = 0x01 => "CONTINUOUS",
        /// Run a single focus pass.
        ONE_SHOT = 0x02 => "ONE_SHOT",
    }
}
