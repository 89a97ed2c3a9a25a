//! Sample acquisition plumbing
//!
//! Shared axis state, the sample consumer trait, and the acquisition mode
//! selected at construction. The per-tick read paths themselves live on
//! the driver in [`crate::device`]; this module holds the data they share
//! with calibration and the control surface.

use core::sync::atomic::{AtomicI16, Ordering};

/// How samples leave the chip.
///
/// Picked once at construction, from whether a usable interrupt line is
/// wired; it cannot change over the device's lifetime. The polled
/// intervals here are starting values only, the control surface can
/// adjust them later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionMode {
    /// Data-ready interrupt; the handler reads and publishes both engines
    Interrupt,
    /// Periodic polling with independent per-engine cadence
    Polled {
        /// Initial accelerometer poll interval, milliseconds
        accel_interval_ms: u32,
        /// Initial gyroscope poll interval, milliseconds
        gyro_interval_ms: u32,
    },
}

/// Consumer of published samples.
///
/// One call carries all three axes of one engine, so a consumer never
/// observes a half-updated triple.
pub trait SampleSink {
    /// Publish one accelerometer sample
    fn report_accel(&mut self, x: i16, y: i16, z: i16);
    /// Publish one gyroscope sample
    fn report_gyro(&mut self, rx: i16, ry: i16, rz: i16);
}

/// Latest raw axis values and calibration offsets.
///
/// The acquisition tick, the calibration routine, and the offset
/// attributes all touch these fields, and the original driver never
/// ordered those accesses against each other. Each field is an atomic
/// with relaxed ordering: a reader may see a mix of old and new axes
/// across fields, but never a torn value.
#[derive(Debug, Default)]
pub struct AxisState {
    /// Last accelerometer X reading
    pub x: AtomicI16,
    /// Last accelerometer Y reading
    pub y: AtomicI16,
    /// Last accelerometer Z reading
    pub z: AtomicI16,
    /// Last gyroscope X reading
    pub rx: AtomicI16,
    /// Last gyroscope Y reading
    pub ry: AtomicI16,
    /// Last gyroscope Z reading
    pub rz: AtomicI16,
    /// Accelerometer X offset
    pub off_x: AtomicI16,
    /// Accelerometer Y offset
    pub off_y: AtomicI16,
    /// Accelerometer Z offset
    pub off_z: AtomicI16,
    /// Gyroscope X offset
    pub off_rx: AtomicI16,
    /// Gyroscope Y offset
    pub off_ry: AtomicI16,
    /// Gyroscope Z offset
    pub off_rz: AtomicI16,
}

impl AxisState {
    /// Fresh state with all readings and offsets zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            x: AtomicI16::new(0),
            y: AtomicI16::new(0),
            z: AtomicI16::new(0),
            rx: AtomicI16::new(0),
            ry: AtomicI16::new(0),
            rz: AtomicI16::new(0),
            off_x: AtomicI16::new(0),
            off_y: AtomicI16::new(0),
            off_z: AtomicI16::new(0),
            off_rx: AtomicI16::new(0),
            off_ry: AtomicI16::new(0),
            off_rz: AtomicI16::new(0),
        }
    }

    pub(crate) fn store_accel(&self, sample: [i16; 3]) {
        self.x.store(sample[0], Ordering::Relaxed);
        self.y.store(sample[1], Ordering::Relaxed);
        self.z.store(sample[2], Ordering::Relaxed);
    }

    pub(crate) fn store_gyro(&self, sample: [i16; 3]) {
        self.rx.store(sample[0], Ordering::Relaxed);
        self.ry.store(sample[1], Ordering::Relaxed);
        self.rz.store(sample[2], Ordering::Relaxed);
    }

    /// Accelerometer offsets as a triple
    #[must_use]
    pub fn accel_offsets(&self) -> [i16; 3] {
        [
            self.off_x.load(Ordering::Relaxed),
            self.off_y.load(Ordering::Relaxed),
            self.off_z.load(Ordering::Relaxed),
        ]
    }

    /// Gyroscope offsets as a triple
    #[must_use]
    pub fn gyro_offsets(&self) -> [i16; 3] {
        [
            self.off_rx.load(Ordering::Relaxed),
            self.off_ry.load(Ordering::Relaxed),
            self.off_rz.load(Ordering::Relaxed),
        ]
    }

    pub(crate) fn set_accel_offsets(&self, off: [i16; 3]) {
        self.off_x.store(off[0], Ordering::Relaxed);
        self.off_y.store(off[1], Ordering::Relaxed);
        self.off_z.store(off[2], Ordering::Relaxed);
    }

    pub(crate) fn set_gyro_offsets(&self, off: [i16; 3]) {
        self.off_rx.store(off[0], Ordering::Relaxed);
        self.off_ry.store(off[1], Ordering::Relaxed);
        self.off_rz.store(off[2], Ordering::Relaxed);
    }
}
