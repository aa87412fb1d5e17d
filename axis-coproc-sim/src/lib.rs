//! # Host model of the coprocessor lab hardware
//!
//! Software stand-ins for the programmable logic side of the labs, so the complete processing
//! system flow of [axis_coproc] can run on a host:
//!
//! - [SoftCoprocessor]: the HLS coprocessor IP.
//! - [SimFifo]: AXI-Stream FIFO with a fabric thread and an interrupt line.
//! - [SimDma]: AXI DMA in simple transfer mode.
//! - [HostCounter], [StdoutSink] and [SerialLoopback] for timing, console and the UART.
use axis_coproc::error::InitError;

pub mod coprocessor;
pub mod dma;
pub mod fifo;
pub mod host;
pub mod serial;

pub use coprocessor::{SimError, SoftCoprocessor};
pub use dma::SimDma;
pub use fifo::{InterruptLine, SimFifo};
pub use host::{HostCounter, StdoutSink};
pub use serial::SerialLoopback;

pub const FIFO_DEVICE_ID: u16 = 0;
pub const DMA_DEVICE_ID: u16 = 1;

/// Static configuration of a simulated peripheral.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device_id: u16,
    pub name: &'static str,
    /// FIFO depth in words, or the number of status polls a DMA channel stays busy.
    pub depth: usize,
}

static DEVICES: [DeviceConfig; 2] = [
    DeviceConfig {
        device_id: FIFO_DEVICE_ID,
        name: "axi_fifo_mm_s_0",
        depth: 1024,
    },
    DeviceConfig {
        device_id: DMA_DEVICE_ID,
        name: "axi_dma_0",
        depth: 8,
    },
];

/// Look up the configuration of a simulated peripheral.
pub fn lookup(device_id: u16) -> Result<&'static DeviceConfig, InitError> {
    DEVICES
        .iter()
        .find(|config| config.device_id == device_id)
        .ok_or_else(|| {
            log::error!("no config found for device {}", device_id);
            InitError::ConfigNotFound(device_id)
        })
}
