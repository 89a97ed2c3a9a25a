//! Embassy task glue
//!
//! The driver core is runtime-free; this module wires its polling ticks
//! and suspend/resume halves into embassy. The two pollers are plain
//! async functions, meant to be wrapped in executor tasks by the
//! firmware, sharing the driver behind an `embassy-sync` mutex.
//! [`PollHandle`] is the cancellation token a control-plane caller
//! awaits so no tick is left in flight across a disable or suspend.

use core::sync::atomic::{AtomicBool, Ordering};

use device_driver::RegisterInterface;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Timer};

use crate::acquisition::SampleSink;
use crate::device::{Engine, Mpu6050Driver};
use crate::power::{EnableLine, Regulator, POWER_UP_TIME_MS};
use crate::Error;

/// Cancellation token for one poll loop.
///
/// `stop` is synchronous in effect: it resolves only after the loop has
/// observed the flag and exited, so the caller knows no tick runs
/// afterwards.
pub struct PollHandle {
    cancel: AtomicBool,
    running: AtomicBool,
    stopped: Signal<CriticalSectionRawMutex, ()>,
}

impl PollHandle {
    /// New idle handle
    pub const fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            running: AtomicBool::new(false),
            stopped: Signal::new(),
        }
    }

    fn begin(&self) {
        self.cancel.store(false, Ordering::Release);
        self.stopped.reset();
        self.running.store(true, Ordering::Release);
    }

    fn finish(&self) {
        self.running.store(false, Ordering::Release);
        self.stopped.signal(());
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Request the loop to exit and wait until it has.
    ///
    /// Returns immediately if the loop is not running.
    pub async fn stop(&self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        self.cancel.store(true, Ordering::Release);
        self.stopped.wait().await;
    }
}

impl Default for PollHandle {
    fn default() -> Self {
        Self::new()
    }
}

async fn poll_loop<M, I, R, L, S>(
    device: &Mutex<M, Mpu6050Driver<I, R, L, S>>,
    handle: &PollHandle,
    engine: Engine,
) where
    M: RawMutex,
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    handle.begin();
    loop {
        if handle.cancelled() {
            break;
        }
        let interval_ms = {
            let mut dev = device.lock().await;
            if dev.poller_armed(engine) {
                let result = match engine {
                    Engine::Accel => dev.poll_accel_once(),
                    Engine::Gyro => dev.poll_gyro_once(),
                };
                if result.is_err() {
                    warn!("poll tick failed, engine {:?}", engine);
                }
            }
            dev.poll_interval(engine)
        };
        Timer::after_millis(u64::from(interval_ms)).await;
    }
    handle.finish();
}

/// Self-rescheduling accelerometer poller. Runs until its handle is
/// stopped; ticks are skipped while the engine's poller is disarmed.
pub async fn accel_poll_loop<M, I, R, L, S>(
    device: &Mutex<M, Mpu6050Driver<I, R, L, S>>,
    handle: &PollHandle,
) where
    M: RawMutex,
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    poll_loop(device, handle, Engine::Accel).await;
}

/// Self-rescheduling gyroscope poller
pub async fn gyro_poll_loop<M, I, R, L, S>(
    device: &Mutex<M, Mpu6050Driver<I, R, L, S>>,
    handle: &PollHandle,
) where
    M: RawMutex,
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    poll_loop(device, handle, Engine::Gyro).await;
}

/// Suspend the device, waiting out both pollers first so no tick is in
/// flight when the rails drop.
pub async fn suspend<M, I, R, L, S>(
    device: &Mutex<M, Mpu6050Driver<I, R, L, S>>,
    accel: &PollHandle,
    gyro: &PollHandle,
) -> Result<(), Error<I::Error>>
where
    M: RawMutex,
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    accel.stop().await;
    gyro.stop().await;
    device.lock().await.suspend(&mut Delay)
}

/// Resume the device: rails up, a full power-up settle off the lock,
/// then configuration restore and engine re-enable. The firmware
/// re-spawns the poll loops afterwards.
pub async fn resume<M, I, R, L, S>(
    device: &Mutex<M, Mpu6050Driver<I, R, L, S>>,
) -> Result<(), Error<I::Error>>
where
    M: RawMutex,
    I: RegisterInterface<AddressType = u8>,
    R: Regulator,
    L: EnableLine,
    S: SampleSink,
{
    device.lock().await.resume(&mut Delay)?;
    Timer::after_millis(u64::from(POWER_UP_TIME_MS)).await;
    device.lock().await.complete_resume(&mut Delay)
}
