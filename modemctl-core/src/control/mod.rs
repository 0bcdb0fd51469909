//! Modem control context: initialization, the phone-active handler, and the
//! power sequencer.
//!
//! [`ModemControl`] is shared between two execution contexts: the interrupt
//! glue calling [`ModemControl::on_phone_active_irq`], and a blocking caller
//! driving [`ModemOps`]. Lifecycle state, pin access, the interrupt binding,
//! and telemetry all sit behind one blocking mutex. Every lock is held only for
//! a read-decide-write of a few pins; every sleep of a sequence happens with
//! the lock released, so the monitor can run in the middle of a power-on.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::error::ModemError;
use crate::irq::{PhoneActiveIrq, TriggerLevel};
use crate::lifecycle::{LifecycleNotifier, LifecycleState};
use crate::lines::{GpioBank, Level, ModemLine, ModemLines, ModemPlatformData};
use crate::link::{LinkControl, WritePend, WritePendPolicy};
use crate::monitor::{self, MonitorDecision, PhoneActiveSample};
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::sequences::{
    SequenceKind, SequenceStep, SequenceTemplate, power_off_retry_policy, power_on_template,
    reset_template,
};
use crate::telemetry::{TelemetryEventKind, TelemetryPayload, TelemetryRecorder};

/// Blocking time source used by the sequencer.
pub trait SequenceDelay {
    /// Blocks the calling context for `duration`.
    fn sleep(&mut self, duration: Duration);

    /// Short spin or busy delay used between power-off polls.
    fn busy_wait(&mut self, duration: Duration);
}

impl<T: SequenceDelay + ?Sized> SequenceDelay for &mut T {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }

    fn busy_wait(&mut self, duration: Duration) {
        (**self).busy_wait(duration);
    }
}

/// Power operations exposed to the modem manager.
///
/// Each operation blocks for the length of its script and must be called from
/// a context that may sleep. Calls are expected to be serialized by the caller.
pub trait ModemOps {
    /// Starts the modem. Ends in [`LifecycleState::Booting`]; the monitor
    /// reports [`LifecycleState::Online`] once the modem raises its active line.
    ///
    /// # Errors
    ///
    /// [`ModemError::Configuration`] when `CP_ON` or `CP_RESET` is not wired.
    /// No line is touched in that case.
    fn modem_on<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError>;

    /// Shuts the modem down, forcing reset if it does not let go of its active
    /// line. Succeeds even when the forced path is taken.
    ///
    /// # Errors
    ///
    /// [`ModemError::Configuration`] when `CP_OFF`, `CP_RESET`, `CP_ON` or
    /// `PHONE_ACTIVE` is not wired. No line is touched in that case.
    fn modem_off<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError>;

    /// Pulses reset. Leaves lifecycle state to the monitor.
    ///
    /// # Errors
    ///
    /// [`ModemError::Configuration`] when `CP_RESET` is not wired.
    fn modem_reset<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError>;

    /// Dispatches to the operation for `kind`.
    ///
    /// # Errors
    ///
    /// Whatever the dispatched operation returns.
    fn run<D: SequenceDelay>(&self, kind: SequenceKind, delay: &mut D) -> Result<(), ModemError> {
        match kind {
            SequenceKind::PowerOn => self.modem_on(delay),
            SequenceKind::PowerOff => self.modem_off(delay),
            SequenceKind::Reset => self.modem_reset(delay),
        }
    }
}

/// Collaborators handed to [`ModemControl`].
pub struct ModemParts<G, I, L, N> {
    pub gpio: G,
    pub irq: I,
    pub link: L,
    pub notifier: N,
}

struct Shared<G, I> {
    gpio: G,
    irq: I,
    state: LifecycleState,
    telemetry: TelemetryRecorder,
}

/// Control context for one modem.
pub struct ModemControl<R, G, I, L, N>
where
    R: RawMutex,
{
    name: &'static str,
    lines: ModemLines,
    irq_name: &'static str,
    write_pend_policy: WritePendPolicy,
    off_retry: RetryPolicy,
    shared: Mutex<R, RefCell<Shared<G, I>>>,
    link: L,
    notifier: N,
}

impl<R, G, I, L, N> ModemControl<R, G, I, L, N>
where
    R: RawMutex,
{
    /// Builds a context without validating lines or touching hardware.
    ///
    /// Use [`ModemControl::init`] for the normal attach path.
    pub fn new(data: &ModemPlatformData, parts: ModemParts<G, I, L, N>) -> Self {
        let ModemParts {
            gpio,
            irq,
            link,
            notifier,
        } = parts;

        Self {
            name: data.name,
            lines: data.lines(),
            irq_name: data.phone_active_irq,
            write_pend_policy: data.write_pend_policy,
            off_retry: power_off_retry_policy(),
            shared: Mutex::new(RefCell::new(Shared {
                gpio,
                irq,
                state: LifecycleState::Offline,
                telemetry: TelemetryRecorder::new(),
            })),
            link,
            notifier,
        }
    }

    /// Replaces the power-off retry policy.
    #[must_use]
    pub fn with_power_off_policy(mut self, policy: RetryPolicy) -> Self {
        self.off_retry = policy;
        self
    }

    /// Platform name of the modem.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Line table bound at construction.
    #[must_use]
    pub fn lines(&self) -> &ModemLines {
        &self.lines
    }

    /// Power-off retry policy in effect.
    #[must_use]
    pub fn power_off_policy(&self) -> RetryPolicy {
        self.off_retry
    }

    /// Transport link handed in at construction.
    #[must_use]
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Last recorded lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.shared.lock(|shared| shared.borrow().state)
    }

    /// Runs `f` against the telemetry ring with the context locked.
    pub fn with_telemetry<U>(&self, f: impl FnOnce(&TelemetryRecorder) -> U) -> U {
        self.shared.lock(|shared| f(&shared.borrow().telemetry))
    }

    fn record(&self, event: TelemetryEventKind, payload: TelemetryPayload) {
        self.shared.lock(|shared| {
            shared.borrow_mut().telemetry.record(event, payload);
        });
    }

    fn require<T>(&self, required: T) -> Result<(), ModemError>
    where
        T: IntoIterator<Item = ModemLine>,
    {
        match self.lines.first_missing(required) {
            Some(line) => {
                error!("{}: no gpio data for {:?}", self.name, line);
                Err(ModemError::Configuration(line))
            }
            None => Ok(()),
        }
    }
}

impl<R, G, I, L, N> ModemControl<R, G, I, L, N>
where
    R: RawMutex,
    G: GpioBank,
    I: PhoneActiveIrq,
    N: LifecycleNotifier,
{
    /// Attaches the modem: validates the line table, parks the modem in reset,
    /// requests the phone-active interrupt at level-high, and arms it as a
    /// wake source.
    ///
    /// A wake-source failure is logged and does not fail initialization.
    ///
    /// # Errors
    ///
    /// [`ModemError::Configuration`] when `CP_ON`, `CP_RESET`, or
    /// `PHONE_ACTIVE` is not wired, and [`ModemError::InterruptRegistration`]
    /// when the interrupt cannot be requested.
    pub fn init(
        data: &ModemPlatformData,
        parts: ModemParts<G, I, L, N>,
    ) -> Result<Self, ModemError> {
        let control = Self::new(data, parts);
        control.require([ModemLine::CpOn, ModemLine::CpReset, ModemLine::PhoneActive])?;

        control.drive(ModemLine::CpReset, Level::Low);
        control.drive(ModemLine::CpOn, Level::Low);

        let irq_name = control.irq_name;
        info!("{}: phone active irq `{}`", control.name, irq_name);

        control.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            if shared.irq.request(irq_name, TriggerLevel::LevelHigh).is_err() {
                error!("{}: request_irq `{}` failed", control.name, irq_name);
                return Err(ModemError::InterruptRegistration { irq: irq_name });
            }
            shared.telemetry.record(
                TelemetryEventKind::TriggerArmed(TriggerLevel::LevelHigh),
                TelemetryPayload::None,
            );

            if shared.irq.enable_wake().is_err() {
                warn!("{}: enable_irq_wake `{}` failed", control.name, irq_name);
            }
            Ok(())
        })?;

        Ok(control)
    }

    /// Phone-active interrupt handler.
    ///
    /// Samples `CP_RESET` and `PHONE_ACTIVE`, applies [`monitor::evaluate`],
    /// notifies the subscriber, and re-arms the interrupt at the complement of
    /// the sampled active level. A line missing from the table reads as low,
    /// which lands in the offline branch. Never blocks.
    pub fn on_phone_active_irq(&self) -> MonitorDecision {
        let (previous, decision, sample) = self.shared.lock(|shared| {
            let (previous, decision, sample) = {
                let mut shared = shared.borrow_mut();
                let sample = PhoneActiveSample::new(
                    self.sample_locked(&mut shared.gpio, ModemLine::CpReset),
                    self.sample_locked(&mut shared.gpio, ModemLine::PhoneActive),
                );
                let previous = shared.state;
                let decision = monitor::evaluate(sample, previous);

                shared.state = decision.state;
                if let Some(state) = decision.notify {
                    shared.telemetry.record_state(state, Some(sample));
                }
                shared.irq.set_trigger(decision.rearm);
                shared.telemetry.record(
                    TelemetryEventKind::TriggerArmed(decision.rearm),
                    TelemetryPayload::None,
                );
                (previous, decision, sample)
            };

            if let Some(state) = decision.notify {
                self.notifier.on_state_changed(state);
            }
            (previous, decision, sample)
        });

        debug!(
            "{}: phone active irq: state = {:?}, reset = {:?}, active = {:?}",
            self.name, previous, sample.cp_reset, sample.phone_active
        );
        debug!("{}: phone_state = {:?}, rearm {:?}", self.name, decision.state, decision.rearm);
        decision
    }
}

impl<R, G, I, L, N> ModemControl<R, G, I, L, N>
where
    R: RawMutex,
    G: GpioBank,
    N: LifecycleNotifier,
{
    fn sample_locked(&self, gpio: &mut G, line: ModemLine) -> Level {
        self.lines
            .gpio(line)
            .map_or(Level::Low, |num| gpio.get(num))
    }

    fn read(&self, line: ModemLine) -> Level {
        self.shared
            .lock(|shared| self.sample_locked(&mut shared.borrow_mut().gpio, line))
    }

    fn drive(&self, line: ModemLine, level: Level) {
        let Some(gpio) = self.lines.gpio(line) else {
            return;
        };
        self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.gpio.set(gpio, level);
            shared.telemetry.record_line(line, gpio, level);
        });
        trace!("{}: {:?} -> {:?}", self.name, line, level);
    }

    /// Records `state` and notifies the subscriber without releasing the lock
    /// in between, so notifications arrive in state order.
    fn transition(&self, state: LifecycleState) {
        self.shared.lock(|shared| {
            {
                let mut shared = shared.borrow_mut();
                shared.state = state;
                shared.telemetry.record_state(state, None);
            }
            self.notifier.on_state_changed(state);
        });
    }

    fn run_template<D: SequenceDelay>(&self, template: &SequenceTemplate, delay: &mut D) {
        for step in template.steps() {
            match *step {
                SequenceStep::Drive(line, level) => self.drive(line, level),
                SequenceStep::Sleep(duration) => delay.sleep(duration),
            }
        }
    }
}

impl<R, G, I, L, N> ModemOps for ModemControl<R, G, I, L, N>
where
    R: RawMutex,
    G: GpioBank,
    L: LinkControl,
    N: LifecycleNotifier,
{
    fn modem_on<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError> {
        let template = power_on_template();
        self.require(template.driven_lines())?;
        info!("{}: power on", self.name);

        self.record(
            TelemetryEventKind::SequenceStarted(SequenceKind::PowerOn),
            TelemetryPayload::None,
        );
        self.link.init_magic_num();
        self.run_template(&template, delay);
        self.transition(LifecycleState::Booting);
        self.record(
            TelemetryEventKind::SequenceComplete(SequenceKind::PowerOn),
            TelemetryPayload::None,
        );
        Ok(())
    }

    fn modem_off<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError> {
        self.require([
            ModemLine::CpOff,
            ModemLine::CpReset,
            ModemLine::CpOn,
            ModemLine::PhoneActive,
        ])?;
        info!("{}: power off", self.name);

        self.record(
            TelemetryEventKind::SequenceStarted(SequenceKind::PowerOff),
            TelemetryPayload::None,
        );
        self.drive(ModemLine::CpOn, Level::Low);

        let outcome = self.off_retry.run(
            || self.read(ModemLine::PhoneActive).is_low(),
            |_| {
                warn!("{}: modem still active, forcing CP_RESET low", self.name);
                self.drive(ModemLine::CpReset, Level::Low);
            },
            |interval| delay.busy_wait(interval),
        );

        match outcome {
            RetryOutcome::Satisfied { retries } => {
                info!("{}: power off success after {} retries", self.name, retries);
            }
            RetryOutcome::Exhausted { retries } => {
                error!("{}: power off failed after {} retries", self.name, retries);
                self.record(
                    TelemetryEventKind::PowerOffTimeout,
                    TelemetryPayload::Retries(retries),
                );
            }
        }

        self.transition(LifecycleState::Offline);
        self.record(
            TelemetryEventKind::SequenceComplete(SequenceKind::PowerOff),
            TelemetryPayload::None,
        );
        Ok(())
    }

    fn modem_reset<D: SequenceDelay>(&self, delay: &mut D) -> Result<(), ModemError> {
        let template = reset_template();
        self.require(template.driven_lines())?;
        debug!("{}: reset", self.name);

        self.record(
            TelemetryEventKind::SequenceStarted(SequenceKind::Reset),
            TelemetryPayload::None,
        );

        if self.link.write_pend() == WritePend::Locked {
            self.record(
                TelemetryEventKind::WritePendObserved(WritePend::Locked),
                TelemetryPayload::None,
            );
            match self.write_pend_policy {
                WritePendPolicy::Observe => {
                    warn!("{}: link write pending during reset, left locked", self.name);
                }
                WritePendPolicy::Release => {
                    info!("{}: releasing link write lock before reset", self.name);
                    self.link.release_write_pend();
                }
            }
        }

        self.link.init_magic_num();
        self.run_template(&template, delay);
        self.record(
            TelemetryEventKind::SequenceComplete(SequenceKind::Reset),
            TelemetryPayload::None,
        );
        Ok(())
    }
}
