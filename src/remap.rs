//! Mounting-orientation axis remap
//!
//! A fixed table of eight mounting orientations, each mapping sensor
//! axes onto board axes with per-axis sign flips. Accelerometer and
//! gyroscope carry separate tables; orientation 0 is the natural
//! mounting position and is never remapped at all, so its table rows
//! are effectively unused.

/// Axis source indices and signs for one orientation
#[derive(Debug, Clone, Copy)]
struct AxisRemap {
    src_x: usize,
    src_y: usize,
    src_z: usize,
    sign_x: i16,
    sign_y: i16,
    sign_z: i16,
}

const ACCEL_REMAP: [AxisRemap; 8] = [
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: 1, sign_y: 1, sign_z: 1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: 1, sign_y: -1, sign_z: 1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: -1, sign_y: -1, sign_z: 1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: -1, sign_y: 1, sign_z: 1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: -1, sign_y: 1, sign_z: -1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: -1, sign_y: -1, sign_z: -1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: 1, sign_y: -1, sign_z: -1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: 1, sign_y: 1, sign_z: -1 },
];

const GYRO_REMAP: [AxisRemap; 8] = [
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: -1, sign_y: 1, sign_z: -1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: -1, sign_y: -1, sign_z: -1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: 1, sign_y: -1, sign_z: -1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: 1, sign_y: 1, sign_z: -1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: 1, sign_y: 1, sign_z: 1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: 1, sign_y: -1, sign_z: 1 },
    AxisRemap { src_x: 0, src_y: 1, src_z: 2, sign_x: -1, sign_y: -1, sign_z: 1 },
    AxisRemap { src_x: 1, src_y: 0, src_z: 2, sign_x: -1, sign_y: 1, sign_z: 1 },
];

/// Physical mounting orientation of the sensor package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// Identity mapping
    #[default]
    PortraitUp,
    /// Rotated 90 degrees clockwise
    LandscapeRight,
    /// Rotated 180 degrees
    PortraitDown,
    /// Rotated 90 degrees counter-clockwise
    LandscapeLeft,
    /// Back side, identity rotation
    PortraitUpBack,
    /// Back side, 90 degrees clockwise
    LandscapeRightBack,
    /// Back side, 180 degrees
    PortraitDownBack,
    /// Back side, 90 degrees counter-clockwise
    LandscapeLeftBack,
}

impl Orientation {
    /// All orientations in table order
    pub const ALL: [Orientation; 8] = [
        Orientation::PortraitUp,
        Orientation::LandscapeRight,
        Orientation::PortraitDown,
        Orientation::LandscapeLeft,
        Orientation::PortraitUpBack,
        Orientation::LandscapeRightBack,
        Orientation::PortraitDownBack,
        Orientation::LandscapeLeftBack,
    ];

    /// Human-readable placement name, as used in board descriptions
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Orientation::PortraitUp => "Portrait Up",
            Orientation::LandscapeRight => "Landscape Right",
            Orientation::PortraitDown => "Portrait Down",
            Orientation::LandscapeLeft => "Landscape Left",
            Orientation::PortraitUpBack => "Portrait Up Back Side",
            Orientation::LandscapeRightBack => "Landscape Right Back Side",
            Orientation::PortraitDownBack => "Portrait Down Back Side",
            Orientation::LandscapeLeftBack => "Landscape Left Back Side",
        }
    }

    /// Look an orientation up by placement name. Unknown names fall back
    /// to the identity orientation.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        for orientation in Self::ALL {
            if orientation.name() == name {
                return orientation;
            }
        }
        warn!("unknown placement name, using identity orientation");
        Orientation::PortraitUp
    }

    const fn index(self) -> usize {
        match self {
            Orientation::PortraitUp => 0,
            Orientation::LandscapeRight => 1,
            Orientation::PortraitDown => 2,
            Orientation::LandscapeLeft => 3,
            Orientation::PortraitUpBack => 4,
            Orientation::LandscapeRightBack => 5,
            Orientation::PortraitDownBack => 6,
            Orientation::LandscapeLeftBack => 7,
        }
    }
}

fn apply(remap: &AxisRemap, raw: [i16; 3]) -> [i16; 3] {
    [
        raw[remap.src_x].wrapping_mul(remap.sign_x),
        raw[remap.src_y].wrapping_mul(remap.sign_y),
        raw[remap.src_z].wrapping_mul(remap.sign_z),
    ]
}

/// Remap a raw accelerometer reading for the given orientation.
///
/// The identity orientation passes the reading through untouched.
#[must_use]
pub fn remap_accel(orientation: Orientation, raw: [i16; 3]) -> [i16; 3] {
    if orientation == Orientation::PortraitUp {
        return raw;
    }
    apply(&ACCEL_REMAP[orientation.index()], raw)
}

/// Remap a raw gyroscope reading for the given orientation.
///
/// The identity orientation passes the reading through untouched; the
/// gyro table's row 0 sign flips are never applied.
#[must_use]
pub fn remap_gyro(orientation: Orientation, raw: [i16; 3]) -> [i16; 3] {
    if orientation == Orientation::PortraitUp {
        return raw;
    }
    apply(&GYRO_REMAP[orientation.index()], raw)
}
