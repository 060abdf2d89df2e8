use cir_types::{CirError, CirResult, RadioConfig};
use log::{debug, info};

use crate::{LoadMode, SpiRate, UwbDevice};

/// Сброс и настройка трансивера перед работой.
///
/// Порядок жёсткий: инициализация DW1000 возможна только на низкой скорости
/// SPI, пока тактирование идёт от кварца.
pub fn bring_up(
    device: &mut dyn UwbDevice,
    radio: &RadioConfig,
    mode: LoadMode,
) -> CirResult<()> {
    radio.validate()?;

    device.reset()?;
    device.set_spi_rate(SpiRate::Low)?;

    device
        .initialise(mode)
        .map_err(|e| CirError::transport(format!("unable to initialise device: {e}")))?;

    device.set_spi_rate(SpiRate::High)?;
    device.configure(radio)?;

    let info = device.info();
    info!(
        "{} (id 0x{:08X}) configured: {radio}",
        info.name, info.device_id
    );
    debug!("Load mode: {mode:?}");

    Ok(())
}
