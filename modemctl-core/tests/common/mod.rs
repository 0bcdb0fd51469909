#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;
use modemctl_core::irq::{PhoneActiveIrq, TriggerLevel};
use modemctl_core::link::{LinkControl, WritePend, WritePendPolicy};
use modemctl_core::{
    GpioBank, GpioNum, LifecycleNotifier, LifecycleState, Level, ModemControl, ModemParts,
    ModemPlatformData, SequenceDelay,
};

pub const CP_ON: GpioNum = GpioNum(21);
pub const CP_OFF: GpioNum = GpioNum(22);
pub const CP_RESET: GpioNum = GpioNum(23);
pub const PDA_ACTIVE: GpioNum = GpioNum(24);
pub const PHONE_ACTIVE: GpioNum = GpioNum(25);
pub const HOST_WAKEUP: GpioNum = GpioNum(26);
pub const CP_DUMP_INT: GpioNum = GpioNum(27);

/// Fully wired board.
pub fn platform() -> ModemPlatformData {
    ModemPlatformData {
        gpio_cp_on: Some(CP_ON),
        gpio_cp_off: Some(CP_OFF),
        gpio_cp_reset: Some(CP_RESET),
        gpio_pda_active: Some(PDA_ACTIVE),
        gpio_phone_active: Some(PHONE_ACTIVE),
        gpio_host_wakeup: Some(HOST_WAKEUP),
        gpio_cp_dump_int: Some(CP_DUMP_INT),
        ..ModemPlatformData::unwired("qsc6085")
    }
}

#[derive(Default)]
struct BoardState {
    levels: BTreeMap<GpioNum, Level>,
    writes: Vec<(GpioNum, Level)>,
    phone_active_script: VecDeque<Level>,
    phone_active_reads: usize,
}

/// Pin bank double. Clones share state so the test can steer inputs while the
/// control context owns its own handle.
#[derive(Clone, Default)]
pub struct MockBoard(Arc<Mutex<BoardState>>);

impl MockBoard {
    pub fn set_level(&self, gpio: GpioNum, level: Level) {
        self.0.lock().unwrap().levels.insert(gpio, level);
    }

    pub fn level(&self, gpio: GpioNum) -> Level {
        self.0
            .lock()
            .unwrap()
            .levels
            .get(&gpio)
            .copied()
            .unwrap_or(Level::Low)
    }

    /// Levels returned by successive `PHONE_ACTIVE` reads before falling back to
    /// the steady level.
    pub fn script_phone_active(&self, levels: impl IntoIterator<Item = Level>) {
        self.0
            .lock()
            .unwrap()
            .phone_active_script
            .extend(levels);
    }

    pub fn phone_active_reads(&self) -> usize {
        self.0.lock().unwrap().phone_active_reads
    }

    pub fn writes(&self) -> Vec<(GpioNum, Level)> {
        self.0.lock().unwrap().writes.clone()
    }

    pub fn writes_to(&self, gpio: GpioNum) -> Vec<Level> {
        self.writes()
            .into_iter()
            .filter(|(num, _)| *num == gpio)
            .map(|(_, level)| level)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.0.lock().unwrap().writes.clear();
    }
}

impl GpioBank for MockBoard {
    fn get(&mut self, gpio: GpioNum) -> Level {
        let mut state = self.0.lock().unwrap();
        if gpio == PHONE_ACTIVE {
            state.phone_active_reads += 1;
            if let Some(level) = state.phone_active_script.pop_front() {
                return level;
            }
        }
        state.levels.get(&gpio).copied().unwrap_or(Level::Low)
    }

    fn set(&mut self, gpio: GpioNum, level: Level) {
        let mut state = self.0.lock().unwrap();
        state.levels.insert(gpio, level);
        state.writes.push((gpio, level));
    }
}

#[derive(Debug)]
pub struct IrqRefused;

#[derive(Default)]
struct IrqState {
    requested: Vec<(&'static str, TriggerLevel)>,
    triggers: Vec<TriggerLevel>,
    wake_enabled: bool,
    refuse_request: bool,
    refuse_wake: bool,
}

#[derive(Clone, Default)]
pub struct MockIrq(Arc<Mutex<IrqState>>);

impl MockIrq {
    pub fn refuse_request(&self) {
        self.0.lock().unwrap().refuse_request = true;
    }

    pub fn refuse_wake(&self) {
        self.0.lock().unwrap().refuse_wake = true;
    }

    pub fn requested(&self) -> Vec<(&'static str, TriggerLevel)> {
        self.0.lock().unwrap().requested.clone()
    }

    pub fn triggers(&self) -> Vec<TriggerLevel> {
        self.0.lock().unwrap().triggers.clone()
    }

    pub fn armed(&self) -> Option<TriggerLevel> {
        let state = self.0.lock().unwrap();
        state
            .triggers
            .last()
            .copied()
            .or_else(|| state.requested.last().map(|(_, trigger)| *trigger))
    }

    pub fn wake_enabled(&self) -> bool {
        self.0.lock().unwrap().wake_enabled
    }
}

impl PhoneActiveIrq for MockIrq {
    type Error = IrqRefused;

    fn request(&mut self, name: &'static str, trigger: TriggerLevel) -> Result<(), IrqRefused> {
        let mut state = self.0.lock().unwrap();
        if state.refuse_request {
            return Err(IrqRefused);
        }
        state.requested.push((name, trigger));
        Ok(())
    }

    fn set_trigger(&mut self, trigger: TriggerLevel) {
        self.0.lock().unwrap().triggers.push(trigger);
    }

    fn enable_wake(&mut self) -> Result<(), IrqRefused> {
        let mut state = self.0.lock().unwrap();
        if state.refuse_wake {
            return Err(IrqRefused);
        }
        state.wake_enabled = true;
        Ok(())
    }
}

#[derive(Debug)]
struct LinkState {
    magic_inits: usize,
    write_pend: WritePend,
    releases: usize,
}

#[derive(Clone)]
pub struct MockLink(Arc<Mutex<LinkState>>);

impl Default for MockLink {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(LinkState {
            magic_inits: 0,
            write_pend: WritePend::Unlocked,
            releases: 0,
        })))
    }
}

impl MockLink {
    pub fn hold_write_pend(&self) {
        self.0.lock().unwrap().write_pend = WritePend::Locked;
    }

    pub fn magic_inits(&self) -> usize {
        self.0.lock().unwrap().magic_inits
    }

    pub fn releases(&self) -> usize {
        self.0.lock().unwrap().releases
    }

    pub fn write_pend_state(&self) -> WritePend {
        self.0.lock().unwrap().write_pend
    }
}

impl LinkControl for MockLink {
    fn init_magic_num(&self) {
        self.0.lock().unwrap().magic_inits += 1;
    }

    fn write_pend(&self) -> WritePend {
        self.0.lock().unwrap().write_pend
    }

    fn release_write_pend(&self) {
        let mut state = self.0.lock().unwrap();
        state.write_pend = WritePend::Unlocked;
        state.releases += 1;
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<LifecycleState>>>);

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<LifecycleState> {
        self.0.lock().unwrap().clone()
    }
}

impl LifecycleNotifier for RecordingNotifier {
    fn on_state_changed(&self, state: LifecycleState) {
        self.0.lock().unwrap().push(state);
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Wait {
    Sleep(Duration),
    Busy(Duration),
}

/// Delay double that records every wait instead of blocking.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits: Vec<Wait>,
}

impl RecordingDelay {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.waits
            .iter()
            .filter_map(|wait| match wait {
                Wait::Sleep(duration) => Some(*duration),
                Wait::Busy(_) => None,
            })
            .collect()
    }

    pub fn busy_waits(&self) -> usize {
        self.waits
            .iter()
            .filter(|wait| matches!(wait, Wait::Busy(_)))
            .count()
    }
}

impl SequenceDelay for RecordingDelay {
    fn sleep(&mut self, duration: Duration) {
        self.waits.push(Wait::Sleep(duration));
    }

    fn busy_wait(&mut self, duration: Duration) {
        self.waits.push(Wait::Busy(duration));
    }
}

pub type Control<R> = ModemControl<R, MockBoard, MockIrq, MockLink, RecordingNotifier>;

/// Test-side handles onto every collaborator of a control context.
#[derive(Clone, Default)]
pub struct Harness {
    pub board: MockBoard,
    pub irq: MockIrq,
    pub link: MockLink,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn parts(&self) -> ModemParts<MockBoard, MockIrq, MockLink, RecordingNotifier> {
        ModemParts {
            gpio: self.board.clone(),
            irq: self.irq.clone(),
            link: self.link.clone(),
            notifier: self.notifier.clone(),
        }
    }

    /// Initializes a context against [`platform`] and forgets the writes
    /// `init` made.
    pub fn init<R: RawMutex>(&self) -> Control<R> {
        self.init_with(&platform())
    }

    pub fn init_with<R: RawMutex>(&self, data: &ModemPlatformData) -> Control<R> {
        let control = ModemControl::init(data, self.parts()).expect("init");
        self.board.clear_writes();
        control
    }
}

pub fn release_policy() -> ModemPlatformData {
    ModemPlatformData {
        write_pend_policy: WritePendPolicy::Release,
        ..platform()
    }
}
