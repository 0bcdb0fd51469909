use modemctl_core::ModemOps;

use super::FirmwareControl;
use crate::hw::BlockingDelay;
use crate::manager::RecoveryPolicy;
use crate::notifier::LifecycleReceiver;

/// Powers the modem on at boot, then reacts to lifecycle updates.
#[embassy_executor::task]
pub async fn run(control: &'static FirmwareControl, events: LifecycleReceiver<'static>) -> ! {
    let mut delay = BlockingDelay;
    let mut policy = RecoveryPolicy::default();

    if let Err(err) = control.modem_on(&mut delay) {
        defmt::error!("manager: power on failed: {}", err);
    }

    loop {
        let state = events.receive().await;
        defmt::info!("manager: modem {}", state);

        let action = policy.on_state(state);
        for kind in action.sequences() {
            if let Err(err) = control.run(*kind, &mut delay) {
                defmt::error!("manager: {} failed: {}", kind, err);
            }
        }
        if !action.sequences().is_empty() {
            defmt::warn!("manager: recovery {} complete", action);
        }
    }
}
