//! Serial device access.

use std::time::Duration;

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};

const OPEN_ATTEMPTS: u32 = 3;
const OPEN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Opens the serial device, retrying a few times.
///
/// Boards re-enumerate after flashing and the device node can appear a
/// moment after the flasher exits.
pub async fn open_with_retry(device: &str, baud: u32) -> HarnessResult<SerialStream> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match tokio_serial::new(device, baud).open_native_async() {
            Ok(stream) => {
                debug!(device, baud, attempt, "serial device open");
                return Ok(stream);
            }
            Err(err) if attempt < OPEN_ATTEMPTS => {
                warn!(device, attempt, error = %err, "serial open failed, retrying");
                tokio::time::sleep(OPEN_RETRY_DELAY).await;
            }
            Err(err) => {
                return Err(HarnessError::Connect {
                    device: device.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }
        }
    }
}
