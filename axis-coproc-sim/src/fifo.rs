//! Simulated AXI-Stream FIFO.
//!
//! The transmit length write hands the request to a fabric thread, which plays the role of the
//! coprocessor connected to the FIFO streams. The fabric thread raises the transmit complete and
//! receive complete status bits and, if they are enabled, signals the interrupt line from its
//! own thread, so the interrupt handler runs concurrently to the main flow like on hardware.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc},
    thread,
};

use axis_coproc::{
    WORD_SIZE_IN_BYTES,
    transfer::{InterruptStatus, StreamFifo},
};

use crate::coprocessor::SoftCoprocessor;

/// Callback which is invoked whenever an enabled status bit is raised.
pub type InterruptLine = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct FifoState {
    tx: VecDeque<u32>,
    depth: usize,
    rx_packets: VecDeque<Vec<u32>>,
    current: VecDeque<u32>,
    isr: u32,
    ier: u32,
    // Bits which a clear can not reset.
    stuck: u32,
    dropped_words: usize,
}

/// Handle to a simulated FIFO. Clones refer to the same FIFO, which is how the interrupt
/// handler gets its own handle.
#[derive(Clone)]
pub struct SimFifo {
    state: Arc<Mutex<FifoState>>,
    jobs: mpsc::Sender<Vec<u32>>,
}

impl SimFifo {
    /// Create the FIFO and start the fabric thread. The thread runs until every handle was
    /// dropped.
    pub fn spawn(coprocessor: SoftCoprocessor, depth: usize, irq: Option<InterruptLine>) -> Self {
        let state = Arc::new(Mutex::new(FifoState {
            depth,
            ..Default::default()
        }));
        let (jobs, requests) = mpsc::channel();
        let fabric_state = state.clone();
        let fabric = thread::Builder::new()
            .name("axis-fabric".into())
            .spawn(move || run_fabric(&fabric_state, &coprocessor, requests, irq.as_ref()));
        if let Err(e) = fabric {
            log::error!("fabric thread could not be started: {e}");
        }
        Self { state, jobs }
    }

    fn state(&self) -> MutexGuard<'_, FifoState> {
        lock(&self.state)
    }

    /// Keep status bits set through any clear, like a FIFO which did not come out of reset.
    pub fn inject_stuck_status(&self, status: InterruptStatus) {
        let mut state = self.state();
        state.stuck |= status.raw_value();
    }

    /// Words written while the transmit FIFO was full.
    pub fn dropped_words(&self) -> usize {
        self.state().dropped_words
    }

    pub fn interrupt_enable(&self) -> InterruptStatus {
        InterruptStatus::new_with_raw_value(self.state().ier)
    }
}

fn lock(state: &Mutex<FifoState>) -> MutexGuard<'_, FifoState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Set status bits. Returns whether one of them is enabled as an interrupt.
fn raise(state: &mut FifoState, status: InterruptStatus) -> bool {
    state.isr |= status.raw_value();
    state.ier & status.raw_value() != 0
}

/// Must be called without holding the state lock because the handler accesses the FIFO itself.
fn signal(irq: Option<&InterruptLine>, fire: bool) {
    if let (true, Some(irq)) = (fire, irq) {
        irq();
    }
}

fn run_fabric(
    state: &Mutex<FifoState>,
    coprocessor: &SoftCoprocessor,
    requests: mpsc::Receiver<Vec<u32>>,
    irq: Option<&InterruptLine>,
) {
    for request in requests {
        let fire = raise(&mut lock(state), InterruptStatus::TRANSMIT_COMPLETE);
        signal(irq, fire);
        let result = match coprocessor.process(&request) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("coprocessor dropped request: {e}");
                continue;
            }
        };
        for packet in coprocessor.packetize(result) {
            // A packet only becomes visible together with its receive complete bit.
            let fire = {
                let mut state = lock(state);
                state.rx_packets.push_back(packet);
                raise(&mut state, InterruptStatus::RECEIVE_COMPLETE)
            };
            signal(irq, fire);
        }
    }
}

impl StreamFifo for SimFifo {
    fn tx_vacancy(&mut self) -> usize {
        let state = self.state();
        state.depth.saturating_sub(state.tx.len())
    }

    fn tx_write_word(&mut self, word: u32) {
        let mut state = self.state();
        if state.tx.len() < state.depth {
            state.tx.push_back(word);
        } else {
            state.dropped_words += 1;
        }
    }

    fn tx_set_len(&mut self, bytes: usize) {
        let request: Vec<u32> = {
            let mut state = self.state();
            let words = (bytes / WORD_SIZE_IN_BYTES).min(state.tx.len());
            state.tx.drain(..words).collect()
        };
        if self.jobs.send(request).is_err() {
            log::error!("fabric thread is not running");
        }
    }

    fn rx_occupancy(&mut self) -> usize {
        let state = self.state();
        state.current.len() + state.rx_packets.iter().map(Vec::len).sum::<usize>()
    }

    fn rx_len(&mut self) -> usize {
        let mut state = self.state();
        let Some(packet) = state.rx_packets.pop_front() else {
            return 0;
        };
        let bytes = packet.len() * WORD_SIZE_IN_BYTES;
        state.current.extend(packet);
        bytes
    }

    fn rx_read_word(&mut self) -> u32 {
        self.state().current.pop_front().unwrap_or(0)
    }

    fn pending(&mut self) -> InterruptStatus {
        let state = self.state();
        InterruptStatus::new_with_raw_value(state.isr | state.stuck)
    }

    fn clear(&mut self, status: InterruptStatus) {
        self.state().isr &= !status.raw_value();
    }

    fn enable_interrupts(&mut self, mask: InterruptStatus) {
        self.state().ier |= mask.raw_value();
    }
}
