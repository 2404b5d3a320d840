use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};

use crate::errors::Error;
use crate::hardware::{Gpio, PinHandle};
use crate::utils::task;
use crate::utils::task::{CancelFlag, TaskHandler};

/// Observable LED level: the mirrored remote truth.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum LedState {
    #[default]
    Off,
    On,
}

/// Controller state machine.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Stage {
    /// Pin could not be claimed (or was released): LED function disabled.
    Idle,
    SteadyOn,
    #[default]
    SteadyOff,
    Blinking,
}

/// At most one per controller: the running blink loop and its cancel token.
#[derive(Debug)]
struct BlinkJob {
    token: CancelFlag,
    handle: TaskHandler,
}

/// Controls one LED on one GPIO pin.
///
/// The controller degrades and logs: a pin that could not be claimed leaves
/// every write a silent no-op, a failed write leaves the stage unchanged.
/// All pin writes serialize through one mutex around the [`PinHandle`], and
/// no guard is held across an await point.
#[derive(Clone, Debug)]
pub struct Led {
    pin: Arc<Mutex<Option<PinHandle>>>,
    pin_id: u16,
    stage: Arc<RwLock<Stage>>,
    blink: Arc<Mutex<Option<BlinkJob>>>,
}

/// Writes a level through the shared handle, logging failures.
/// A missing handle is the degraded mode and stays silent.
fn write_or_log(pin: &Mutex<Option<PinHandle>>, level: bool) {
    if let Some(handle) = pin.lock().as_mut() {
        if let Err(err) = handle.write(level) {
            error!("{}", err);
        }
    }
}

impl Led {
    /// Claims `pin` on the given driver, initially LOW.
    ///
    /// An open failure is logged and the controller returned in `Idle` stage
    /// with every subsequent write a silent no-op.
    pub fn attach(driver: Box<dyn Gpio>, pin: u16) -> Self {
        let (handle, stage) = match PinHandle::open(driver, pin) {
            Ok(handle) => (Some(handle), Stage::SteadyOff),
            Err(err) => {
                error!("LED on pin {} disabled: {}", pin, err);
                (None, Stage::Idle)
            }
        };
        Self {
            pin: Arc::new(Mutex::new(handle)),
            pin_id: pin,
            stage: Arc::new(RwLock::new(stage)),
            blink: Arc::new(Mutex::new(None)),
        }
    }

    /// Turns the LED ON (steady).
    ///
    /// # Errors
    /// Returns `HardwareError::WriteFailed` if the pin write fails; the stage
    /// is left unchanged and no retry is attempted.
    pub fn turn_on(&self) -> Result<&Self, Error> {
        self.write(true)?;
        *self.stage.write() = Stage::SteadyOn;
        Ok(self)
    }

    /// Turns the LED OFF (steady).
    ///
    /// # Errors
    /// Returns `HardwareError::WriteFailed` if the pin write fails; the stage
    /// is left unchanged and no retry is attempted.
    pub fn turn_off(&self) -> Result<&Self, Error> {
        self.write(false)?;
        *self.stage.write() = Stage::SteadyOff;
        Ok(self)
    }

    fn write(&self, level: bool) -> Result<(), Error> {
        match self.pin.lock().as_mut() {
            Some(handle) => handle.write(level),
            // Degraded mode, the pin was never claimed.
            None => Ok(()),
        }
    }

    /// Starts blinking: HIGH then LOW, alternating every `interval_ms`.
    ///
    /// Idempotent: a controller that is already blinking keeps its running
    /// loop. A detached controller logs and stays put.
    pub fn blink(&self, interval_ms: u64) -> &Self {
        if !self.is_attached() {
            warn!("LED on pin {} is detached, blink ignored", self.pin_id);
            return self;
        }

        let mut job = self.blink.lock();
        if let Some(active) = job.as_ref() {
            if !active.handle.is_finished() {
                debug!("LED on pin {} is already blinking", self.pin_id);
                return self;
            }
        }

        let token = CancelFlag::new();
        let loop_token = token.clone();
        let pin = self.pin.clone();
        let handle = task::spawn(async move {
            while !loop_token.is_cancelled() {
                write_or_log(&pin, true);
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)) => {}
                }
                write_or_log(&pin, false);
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)) => {}
                }
            }
        });
        *job = Some(BlinkJob { token, handle });
        drop(job);

        *self.stage.write() = Stage::Blinking;
        self
    }

    /// Stops a running blink loop: cancels it cooperatively, awaits its
    /// termination, then forces the pin LOW.
    ///
    /// A controller with no active blink is left untouched (the pin keeps its
    /// current level).
    pub async fn stop_blink(&self) -> &Self {
        let job = self.blink.lock().take();
        if let Some(job) = job {
            job.token.cancel();
            let _ = job.handle.await;
            write_or_log(&self.pin, false);
            *self.stage.write() = Stage::SteadyOff;
        }
        self
    }

    /// Releases the LED: stops any blink and closes the pin exactly once.
    /// Subsequent calls are no-ops.
    pub async fn close(&self) -> &Self {
        let job = self.blink.lock().take();
        if let Some(job) = job {
            job.token.cancel();
            let _ = job.handle.await;
        }

        let handle = self.pin.lock().take();
        if let Some(mut handle) = handle {
            if let Err(err) = handle.close() {
                error!("{}", err);
            }
            *self.stage.write() = Stage::Idle;
        }
        self
    }

    // ########################################
    // Accessors.

    pub fn get_pin(&self) -> u16 {
        self.pin_id
    }

    pub fn get_stage(&self) -> Stage {
        *self.stage.read()
    }

    /// Current LED level as mirrored state.
    pub fn get_state(&self) -> LedState {
        match self.get_stage() {
            Stage::SteadyOn | Stage::Blinking => LedState::On,
            Stage::Idle | Stage::SteadyOff => LedState::Off,
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.get_stage() == Stage::Blinking
    }

    pub fn is_attached(&self) -> bool {
        self.pin.lock().is_some()
    }
}

impl Display for Led {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LED (pin={}) [stage={:?}, state={:?}]",
            self.pin_id,
            self.get_stage(),
            self.get_state()
        )
    }
}
