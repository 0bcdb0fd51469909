use embassy_stm32::exti::ExtiInput;
use modemctl_core::irq::TriggerLevel;

use super::FirmwareControl;
use crate::irq::TriggerCell;

/// Chases the armed level on `PHONE_ACTIVE` and runs the handler each time it
/// is present.
#[embassy_executor::task]
pub async fn run(
    control: &'static FirmwareControl,
    mut phone_active: ExtiInput<'static>,
    trigger: &'static TriggerCell,
) -> ! {
    defmt::info!(
        "monitor: phone active irq armed (wake source: {})",
        trigger.wake_enabled()
    );

    loop {
        match trigger.armed() {
            Some(TriggerLevel::LevelHigh) => phone_active.wait_for_high().await,
            Some(TriggerLevel::LevelLow) => phone_active.wait_for_low().await,
            None => {
                defmt::warn!("monitor: interrupt not requested, waiting for an edge");
                phone_active.wait_for_any_edge().await;
                continue;
            }
        }

        let decision = control.on_phone_active_irq();
        if let Some(state) = decision.notify {
            defmt::debug!("monitor: {} (rearm {})", state, decision.rearm);
        }
    }
}
