//! Lab sessions over the simulated FIFO and DMA transports.
use std::sync::Arc;

use axis_coproc::{
    LabError,
    egress::DelimiterStyle,
    error::InitError,
    lab::LabSession,
    layout::LabConfig,
    transfer::{
        DmaChannel, InterruptFifo, InterruptStatus, IrqDispatcher, IrqLine, PollingFifo,
        TransferChannel, TransferError, TransferShared,
    },
    vectors::TestVector,
};
use axis_coproc_sim::{
    HostCounter, InterruptLine, SerialLoopback, SimDma, SimFifo, SoftCoprocessor, lookup,
};

const FIFO_DEPTH: usize = 1024;
const GENEROUS_POLLS: u32 = u32::MAX;

fn csv(elements: &[u8]) -> Vec<u8> {
    elements
        .iter()
        .flat_map(|e| format!("{e}\n").into_bytes())
        .collect()
}

fn config(vector: &TestVector, vectors: usize) -> LabConfig {
    LabConfig::new(vector.layout)
        .with_model(vector.model)
        .with_test_vectors(vectors)
        .with_rx_timeout(GENEROUS_POLLS)
}

/// FIFO whose interrupt line is routed through a dispatcher to the transfer interrupt handler.
fn interrupt_fifo(coprocessor: SoftCoprocessor) -> (SimFifo, &'static TransferShared) {
    let shared: &'static TransferShared = Box::leak(Box::new(TransferShared::new()));
    let dispatcher: &'static IrqDispatcher<'static> = Box::leak(Box::new(IrqDispatcher::new()));
    let irq: InterruptLine = Arc::new(move || {
        dispatcher.dispatch(IrqLine::AxiFifo);
    });
    let fifo = SimFifo::spawn(coprocessor, FIFO_DEPTH, Some(irq));
    let mut isr_fifo = fifo.clone();
    let handler = Box::leak(Box::new(move || shared.on_interrupt(&mut isr_fifo)));
    dispatcher.register(IrqLine::AxiFifo, handler).unwrap();
    (fifo, shared)
}

fn run<C: TransferChannel>(channel: C, vector: &TestVector, vectors: usize) -> Vec<u32> {
    let mut session = LabSession::new(channel, HostCounter::new(), config(vector, vectors));
    let mut results = vec![0; session.results_len()];
    let report = session.run_slice(&csv(vector.input), &mut results).unwrap();
    assert!(report.passed, "{} failed: {:?}", vector.name, report);
    assert_eq!(report.vectors, vectors);
    results
}

#[test]
fn polled_fifo_matmul() {
    let fifo = SimFifo::spawn(
        SoftCoprocessor::for_vector(&TestVector::MATMUL),
        FIFO_DEPTH,
        None,
    );
    let channel = PollingFifo::new(fifo, GENEROUS_POLLS).unwrap();
    let results = run(channel, &TestVector::MATMUL, 1);
    assert_eq!(results, TestVector::MATMUL.expected);
}

#[test]
fn polled_fifo_multi_burst_two_vectors() {
    let coprocessor = SoftCoprocessor::for_vector(&TestVector::MLP).with_bursts(4);
    let fifo = SimFifo::spawn(coprocessor, FIFO_DEPTH, None);
    let channel = PollingFifo::new(fifo, GENEROUS_POLLS).unwrap();
    let results = run(channel, &TestVector::MLP, 2);
    assert_eq!(&results[..64], TestVector::MLP.expected);
    assert_eq!(&results[64..], TestVector::MLP.expected);
}

#[test]
fn interrupt_fifo_matmul() {
    let (fifo, shared) = interrupt_fifo(SoftCoprocessor::for_vector(&TestVector::MATMUL));
    let channel = InterruptFifo::new(fifo.clone(), shared, 1, None).unwrap();
    assert_eq!(
        fifo.interrupt_enable().raw_value(),
        InterruptStatus::COMPLETION.raw_value()
    );
    let results = run(channel, &TestVector::MATMUL, 2);
    assert_eq!(&results[64..], TestVector::MATMUL.expected);
    assert_eq!(shared.tx_completions(), 2);
    assert_eq!(shared.packets_received(), 2);
}

#[test]
fn interrupt_fifo_multi_burst_sigmoid() {
    let coprocessor = SoftCoprocessor::for_vector(&TestVector::MLP_SIGMOID).with_bursts(3);
    let (fifo, shared) = interrupt_fifo(coprocessor);
    let channel = InterruptFifo::new(fifo, shared, 3, None).unwrap();
    let results = run(channel, &TestVector::MLP_SIGMOID, 1);
    assert_eq!(results, TestVector::MLP_SIGMOID.expected);
    assert_eq!(shared.packets_received(), 3);
}

#[test]
fn dma_matmul_two_vectors() {
    let dma = SimDma::new(SoftCoprocessor::for_vector(&TestVector::MATMUL), 16);
    let channel = DmaChannel::new(dma, Some(1_000_000)).unwrap();
    let results = run(channel, &TestVector::MATMUL, 2);
    assert_eq!(&results[..64], TestVector::MATMUL.expected);
    assert_eq!(&results[64..], TestVector::MATMUL.expected);
}

#[test]
fn polled_fifo_times_out_on_stalled_coprocessor() {
    let coprocessor = SoftCoprocessor::for_vector(&TestVector::LAB2).stalled();
    let fifo = SimFifo::spawn(coprocessor, FIFO_DEPTH, None);
    let channel = PollingFifo::new(fifo, 10_000).unwrap();
    let config = LabConfig::new(TestVector::LAB2.layout).with_rx_timeout(10_000);
    let mut session = LabSession::new(channel, HostCounter::new(), config);
    let mut results = [0; 2];
    assert_eq!(
        session.run_slice(&csv(TestVector::LAB2.input), &mut results),
        Err(LabError::Transfer(TransferError::RxTimeout(10_000)))
    );
}

#[test]
fn interrupt_fifo_spin_limit_on_stalled_coprocessor() {
    let coprocessor = SoftCoprocessor::for_vector(&TestVector::LAB2).stalled();
    let (fifo, shared) = interrupt_fifo(coprocessor);
    let channel = InterruptFifo::new(fifo, shared, 1, Some(100_000)).unwrap();
    let mut session = LabSession::new(
        channel,
        HostCounter::new(),
        LabConfig::new(TestVector::LAB2.layout),
    );
    let mut results = [0; 2];
    assert!(matches!(
        session.run_slice(&csv(TestVector::LAB2.input), &mut results),
        Err(LabError::Transfer(TransferError::CompletionTimeout(_)))
    ));
}

#[test]
fn dma_times_out_on_stalled_coprocessor() {
    let dma = SimDma::new(
        SoftCoprocessor::for_vector(&TestVector::LAB2).stalled(),
        4,
    );
    let channel = DmaChannel::new(dma, Some(500)).unwrap();
    let mut session = LabSession::new(
        channel,
        HostCounter::new(),
        LabConfig::new(TestVector::LAB2.layout),
    );
    let mut results = [0; 2];
    assert_eq!(
        session.run_slice(&csv(TestVector::LAB2.input), &mut results),
        Err(LabError::Transfer(TransferError::CompletionTimeout(500)))
    );
}

#[test]
fn corrupted_result_is_reported_not_raised() {
    let coprocessor = SoftCoprocessor::for_vector(&TestVector::MATMUL).with_corrupted_result(10);
    let fifo = SimFifo::spawn(coprocessor, FIFO_DEPTH, None);
    let channel = PollingFifo::new(fifo, GENEROUS_POLLS).unwrap();
    let mut session = LabSession::new(
        channel,
        HostCounter::new(),
        config(&TestVector::MATMUL, 1),
    );
    let mut results = [0; 64];
    let report = session
        .run_slice(&csv(TestVector::MATMUL.input), &mut results)
        .unwrap();
    assert!(!report.passed);
    assert_eq!(report.mismatches, 1);
    assert_eq!(report.first_mismatch.map(|m| m.index), Some(10));
}

#[test]
fn serial_session_echoes_results() {
    let fifo = SimFifo::spawn(
        SoftCoprocessor::for_vector(&TestVector::LAB2),
        FIFO_DEPTH,
        None,
    );
    let channel = PollingFifo::new(fifo, GENEROUS_POLLS).unwrap();
    let config = config(&TestVector::LAB2, 1).with_delimiter(DelimiterStyle::CommaSeparated);
    let mut session = LabSession::new(channel, HostCounter::new(), config);
    let mut serial =
        SerialLoopback::new(b"200\n100\n50\n250\n128\n64\n".to_vec()).with_stall_every(3);
    let mut results = [0; 2];
    let report = session.run_serial(&mut serial, &mut results).unwrap();
    assert!(report.passed);
    assert_eq!(serial.output(), b"125,87\n");
    assert!(serial.stalls() > 0);
}

#[test]
fn fifo_reset_check_and_lookup() {
    let fifo = SimFifo::spawn(
        SoftCoprocessor::for_vector(&TestVector::LAB2),
        FIFO_DEPTH,
        None,
    );
    fifo.inject_stuck_status(InterruptStatus::RECEIVE_COMPLETE);
    assert!(matches!(
        PollingFifo::new(fifo, 1),
        Err(InitError::ResetStatus(0x0400_0000))
    ));
    assert!(matches!(
        DmaChannel::new(
            SimDma::new(SoftCoprocessor::for_vector(&TestVector::LAB2), 1).with_scatter_gather(),
            None
        ),
        Err(InitError::ScatterGatherConfigured)
    ));
    assert_eq!(lookup(42), Err(InitError::ConfigNotFound(42)));
}
