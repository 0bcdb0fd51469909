//! Simulated board: signal lines, a behavioural modem, and a virtual clock.
//!
//! The modem reacts to the lines the controller drives. A `CP_ON` pulse with
//! reset released boots it, and `PHONE_ACTIVE` rises after the configured boot
//! time. Dropping `CP_ON` while it runs starts a shutdown, and
//! holding `CP_RESET` low kills it outright. A hung modem ignores both. The
//! phone-active interrupt is level-triggered: whenever the armed level matches
//! `PHONE_ACTIVE`, the handler runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use log::{debug, info};
use modemctl_core::irq::{PhoneActiveIrq, TriggerLevel};
use modemctl_core::link::{LinkControl, WritePend, WritePendPolicy};
use modemctl_core::sequences::power_on::CP_ON_HOLD;
use modemctl_core::{
    GpioBank, GpioNum, LifecycleNotifier, LifecycleState, Level, ModemControl, ModemPlatformData,
    SequenceDelay,
};

pub const CP_ON: GpioNum = GpioNum(4);
pub const CP_OFF: GpioNum = GpioNum(5);
pub const CP_RESET: GpioNum = GpioNum(6);
pub const PDA_ACTIVE: GpioNum = GpioNum(7);
pub const PHONE_ACTIVE: GpioNum = GpioNum(8);
pub const HOST_WAKEUP: GpioNum = GpioNum(9);

/// Upper bound on back-to-back handler runs for one pending check.
const MAX_IRQ_BURST: usize = 4;

/// Knobs for the simulated modem and the platform description.
#[derive(Clone, Copy, Debug)]
pub struct BoardOptions {
    pub cp_off_wired: bool,
    pub boot_time: Duration,
    pub shutdown_time: Duration,
    pub hung: bool,
    pub write_pend_policy: WritePendPolicy,
}

impl BoardOptions {
    /// Platform description matching the simulated wiring.
    pub fn platform(&self) -> ModemPlatformData {
        ModemPlatformData {
            gpio_cp_on: Some(CP_ON),
            gpio_cp_off: self.cp_off_wired.then_some(CP_OFF),
            gpio_cp_reset: Some(CP_RESET),
            gpio_pda_active: Some(PDA_ACTIVE),
            gpio_phone_active: Some(PHONE_ACTIVE),
            gpio_host_wakeup: Some(HOST_WAKEUP),
            write_pend_policy: self.write_pend_policy,
            ..ModemPlatformData::unwired("qsc6085-sim")
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModemPower {
    Off,
    Booting { ready_at: Duration },
    Running,
    ShuttingDown { done_at: Duration },
}

struct BoardModel {
    options: BoardOptions,
    now: Duration,
    outputs: BTreeMap<GpioNum, Level>,
    phone_active: Level,
    power: ModemPower,
    cp_on_raised_at: Option<Duration>,
    hung: bool,
    armed: Option<TriggerLevel>,
    irq_name: Option<&'static str>,
    wake_enabled: bool,
    write_pend: WritePend,
    magic_inits: u32,
}

impl BoardModel {
    fn output(&self, gpio: GpioNum) -> Level {
        self.outputs.get(&gpio).copied().unwrap_or(Level::Low)
    }

    fn drive(&mut self, gpio: GpioNum, level: Level) {
        let previous = self.output(gpio);
        self.outputs.insert(gpio, level);

        if gpio == CP_RESET && level.is_low() {
            if self.hung {
                debug!("modem ignores CP_RESET");
            } else if self.power != ModemPower::Off {
                info!("modem held in reset");
                self.power = ModemPower::Off;
                self.phone_active = Level::Low;
            }
            self.cp_on_raised_at = None;
            return;
        }

        if gpio == CP_ON && level.is_high() && previous.is_low() {
            if self.output(CP_RESET).is_high() {
                self.cp_on_raised_at = Some(self.now);
            }
            return;
        }

        if gpio == CP_ON && level.is_low() {
            if let Some(raised_at) = self.cp_on_raised_at.take() {
                self.end_power_pulse(self.now - raised_at);
                return;
            }
        }

        if gpio == CP_ON && level.is_low() {
            self.request_shutdown();
        }
    }

    fn end_power_pulse(&mut self, held: Duration) {
        if held < CP_ON_HOLD / 2 {
            debug!("CP_ON pulse too short ({held:?}), ignored");
            return;
        }
        if self.power == ModemPower::Off {
            let ready_at = self.now + self.options.boot_time;
            info!("modem booting, PHONE_ACTIVE expected at +{}ms", ready_at.as_millis());
            self.power = ModemPower::Booting { ready_at };
        }
    }

    fn request_shutdown(&mut self) {
        if self.hung {
            debug!("modem ignores power-off request");
            return;
        }
        if matches!(self.power, ModemPower::Running | ModemPower::Booting { .. }) {
            let done_at = self.now + self.options.shutdown_time;
            info!("modem shutting down, done at +{}ms", done_at.as_millis());
            self.power = ModemPower::ShuttingDown { done_at };
        }
    }

    fn next_event(&self) -> Option<Duration> {
        match self.power {
            ModemPower::Booting { ready_at } => Some(ready_at),
            ModemPower::ShuttingDown { done_at } if !self.hung => Some(done_at),
            _ => None,
        }
    }

    fn set_now(&mut self, now: Duration) {
        self.now = now;
        match self.power {
            ModemPower::Booting { ready_at } if ready_at <= now => {
                info!("modem up, raising PHONE_ACTIVE");
                self.power = ModemPower::Running;
                self.phone_active = Level::High;
            }
            ModemPower::ShuttingDown { done_at } if done_at <= now && !self.hung => {
                info!("modem down, dropping PHONE_ACTIVE");
                self.power = ModemPower::Off;
                self.phone_active = Level::Low;
            }
            _ => {}
        }
    }

    fn irq_pending(&self) -> bool {
        self.armed
            .is_some_and(|trigger| trigger.level() == self.phone_active)
    }
}

/// Shared handle onto the simulated board. Clones see the same board.
#[derive(Clone)]
pub struct SimBoard(Rc<RefCell<BoardModel>>);

impl SimBoard {
    pub fn new(options: BoardOptions) -> Self {
        Self(Rc::new(RefCell::new(BoardModel {
            options,
            now: Duration::ZERO,
            outputs: BTreeMap::new(),
            phone_active: Level::Low,
            power: ModemPower::Off,
            cp_on_raised_at: None,
            hung: options.hung,
            armed: None,
            irq_name: None,
            wake_enabled: false,
            write_pend: WritePend::Unlocked,
            magic_inits: 0,
        })))
    }

    pub fn now(&self) -> Duration {
        self.0.borrow().now
    }

    pub fn power(&self) -> ModemPower {
        self.0.borrow().power
    }

    pub fn level(&self, gpio: GpioNum) -> Level {
        let model = self.0.borrow();
        if gpio == PHONE_ACTIVE {
            model.phone_active
        } else {
            model.output(gpio)
        }
    }

    pub fn armed(&self) -> Option<TriggerLevel> {
        self.0.borrow().armed
    }

    pub fn irq_name(&self) -> Option<&'static str> {
        self.0.borrow().irq_name
    }

    pub fn wake_enabled(&self) -> bool {
        self.0.borrow().wake_enabled
    }

    pub fn write_pend(&self) -> WritePend {
        self.0.borrow().write_pend
    }

    pub fn magic_inits(&self) -> u32 {
        self.0.borrow().magic_inits
    }

    pub fn is_hung(&self) -> bool {
        self.0.borrow().hung
    }

    /// Toggles a modem that ignores shutdown and reset. Returns the new state.
    pub fn toggle_hang(&self) -> bool {
        let mut model = self.0.borrow_mut();
        model.hung = !model.hung;
        model.hung
    }

    /// Toggles the link write-pending lock. Returns the new state.
    pub fn toggle_write_pend(&self) -> WritePend {
        let mut model = self.0.borrow_mut();
        model.write_pend = match model.write_pend {
            WritePend::Locked => WritePend::Unlocked,
            WritePend::Unlocked => WritePend::Locked,
        };
        model.write_pend
    }

    /// Makes a running modem fall over. Returns `false` when it was not running.
    pub fn crash(&self) -> bool {
        let mut model = self.0.borrow_mut();
        if model.power != ModemPower::Running {
            return false;
        }
        info!("modem crashed, dropping PHONE_ACTIVE");
        model.power = ModemPower::Off;
        model.phone_active = Level::Low;
        true
    }

    /// Runs the phone-active handler while its armed level is present.
    pub fn deliver_irq(&self, control: &EmulatorControl) {
        for _ in 0..MAX_IRQ_BURST {
            if !self.0.borrow().irq_pending() {
                break;
            }
            let _ = control.on_phone_active_irq();
        }
    }

    /// Advances the virtual clock by `duration`, delivering interrupts at the
    /// moments the modem changes `PHONE_ACTIVE`.
    pub fn advance(&self, control: &EmulatorControl, duration: Duration) {
        let deadline = self.now() + duration;
        loop {
            self.deliver_irq(control);
            let next = self.0.borrow().next_event();
            match next {
                Some(at) if at <= deadline => self.0.borrow_mut().set_now(at),
                _ => {
                    self.0.borrow_mut().set_now(deadline);
                    self.deliver_irq(control);
                    break;
                }
            }
        }
    }
}

impl GpioBank for SimBoard {
    fn get(&mut self, gpio: GpioNum) -> Level {
        self.level(gpio)
    }

    fn set(&mut self, gpio: GpioNum, level: Level) {
        self.0.borrow_mut().drive(gpio, level);
    }
}

/// Interrupt controller view of the board.
#[derive(Clone)]
pub struct SimIrq(pub SimBoard);

impl PhoneActiveIrq for SimIrq {
    type Error = Infallible;

    fn request(&mut self, name: &'static str, trigger: TriggerLevel) -> Result<(), Infallible> {
        let mut model = self.0.0.borrow_mut();
        model.irq_name = Some(name);
        model.armed = Some(trigger);
        Ok(())
    }

    fn set_trigger(&mut self, trigger: TriggerLevel) {
        self.0.0.borrow_mut().armed = Some(trigger);
    }

    fn enable_wake(&mut self) -> Result<(), Infallible> {
        self.0.0.borrow_mut().wake_enabled = true;
        Ok(())
    }
}

/// Shared-memory link view of the board.
#[derive(Clone)]
pub struct SimLink(pub SimBoard);

impl LinkControl for SimLink {
    fn init_magic_num(&self) {
        self.0.0.borrow_mut().magic_inits += 1;
    }

    fn write_pend(&self) -> WritePend {
        self.0.write_pend()
    }

    fn release_write_pend(&self) {
        self.0.0.borrow_mut().write_pend = WritePend::Unlocked;
    }
}

/// Lifecycle change stamped with virtual time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StateEvent {
    pub at: Duration,
    pub state: LifecycleState,
}

/// Collects lifecycle notifications for the prompt to print.
#[derive(Clone)]
pub struct ConsoleNotifier {
    board: SimBoard,
    events: Rc<RefCell<Vec<StateEvent>>>,
}

impl ConsoleNotifier {
    pub fn new(board: SimBoard) -> Self {
        Self {
            board,
            events: Rc::default(),
        }
    }

    /// Removes and returns every event collected so far.
    pub fn drain(&self) -> Vec<StateEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl LifecycleNotifier for ConsoleNotifier {
    fn on_state_changed(&self, state: LifecycleState) {
        let at = self.board.now();
        info!("lifecycle -> {state} at +{}ms", at.as_millis());
        self.events.borrow_mut().push(StateEvent { at, state });
    }
}

pub type EmulatorControl = ModemControl<NoopRawMutex, SimBoard, SimIrq, SimLink, ConsoleNotifier>;

/// Delay that advances the virtual clock instead of blocking.
pub struct SimDelay<'a> {
    pub board: &'a SimBoard,
    pub control: &'a EmulatorControl,
}

impl SequenceDelay for SimDelay<'_> {
    fn sleep(&mut self, duration: Duration) {
        self.board.advance(self.control, duration);
    }

    fn busy_wait(&mut self, duration: Duration) {
        self.board.advance(self.control, duration);
    }
}
