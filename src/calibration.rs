//! Offset calibration
//!
//! A short burst of remapped samples taken while the device is held
//! still, averaged per axis to produce new persistent offsets. The
//! routine touches nothing but the offsets.

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::acquisition::SampleSink;
use crate::device::{Engine, Mpu6050Driver};
use crate::power::{EnableLine, Regulator};
use crate::Error;

/// Samples averaged per calibration run
pub const CALIBRATION_SAMPLE_COUNT: i32 = 10;

/// Spacing between calibration samples, milliseconds
pub const CALIBRATION_SAMPLE_GAP_MS: u32 = 20;

impl<I, R, L, S> Mpu6050Driver<I, R, L, S>
where
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    /// Compute new offsets for one engine from a still device.
    ///
    /// Forces the engine on (powering the device up if needed), waits one
    /// poll interval for data to become valid, then averages ten remapped
    /// samples at 20 ms spacing with integer truncation. Gyroscope
    /// offsets are the negated mean; accelerometer X/Y likewise, while Z
    /// compensates for gravity against the one-g count of the configured
    /// ±8g range. The engine is returned to its prior enable state.
    pub fn calibrate<D: DelayNs>(
        &mut self,
        engine: Engine,
        delay: &mut D,
    ) -> Result<(), Error<I::Error>> {
        let was_enabled = self.config().enable;

        self.set_engine(engine, true, delay)?;
        delay.delay_ms(self.poll_interval(engine));

        let mut sum = [0i32; 3];
        for _ in 0..CALIBRATION_SAMPLE_COUNT {
            let sample = match engine {
                Engine::Accel => self.sample_accel()?,
                Engine::Gyro => self.sample_gyro()?,
            };
            for (total, axis) in sum.iter_mut().zip(sample) {
                *total += i32::from(axis);
            }
            delay.delay_ms(CALIBRATION_SAMPLE_GAP_MS);
        }
        let mean = sum.map(|total| (total / CALIBRATION_SAMPLE_COUNT) as i16);

        match engine {
            Engine::Accel => {
                let one_g = self.config().accel_fs.unit_per_g();
                self.axis().set_accel_offsets([
                    mean[0].wrapping_neg(),
                    mean[1].wrapping_neg(),
                    one_g.wrapping_sub(mean[2]),
                ]);
            }
            Engine::Gyro => {
                self.axis().set_gyro_offsets([
                    mean[0].wrapping_neg(),
                    mean[1].wrapping_neg(),
                    mean[2].wrapping_neg(),
                ]);
            }
        }
        info!("calibration offsets updated");

        if !was_enabled {
            self.set_engine(engine, false, delay)?;
        }
        Ok(())
    }
}
