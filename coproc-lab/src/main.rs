//! Runs a coprocessor lab session against the simulated programmable logic.
//!
//! Exit code 0 means all test vectors verified, 1 means at least one mismatch and 2 means the
//! session aborted with a fatal error.
use std::{io::Write as _, path::PathBuf, process::ExitCode, sync::Arc};

use axis_coproc::{
    LabError,
    egress::{DelimiterStyle, encode_results},
    ingest::InvalidBytePolicy,
    lab::{LabReport, LabSession},
    layout::{DEFAULT_RX_TIMEOUT, LabConfig},
    transfer::{
        DmaChannel, InterruptFifo, IrqDispatcher, IrqLine, PollingFifo, TransferChannel,
        TransferShared,
    },
    vectors::TestVector,
};
use axis_coproc_sim::{
    DMA_DEVICE_ID, FIFO_DEVICE_ID, HostCounter, InterruptLine, SimDma, SimFifo, SoftCoprocessor,
    StdoutSink, lookup,
};
use clap::{Parser, ValueEnum};
use static_cell::StaticCell;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// 2x2 times 2x1 product
    Lab2,
    /// 64x8 times 8x1 product
    Matmul,
    /// Two-layer perceptron
    Mlp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Transport {
    FifoPolling,
    FifoInterrupt,
    Dma,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Delimiter {
    Newline,
    Comma,
}

impl Delimiter {
    fn style(self) -> DelimiterStyle {
        match self {
            Delimiter::Newline => DelimiterStyle::NewlinePerElement,
            Delimiter::Comma => DelimiterStyle::CommaSeparated,
        }
    }
}

/// Coprocessor lab session runner
#[derive(Parser, Debug)]
#[command(name = "coproc-lab", version, about, long_about = None)]
struct Args {
    /// Lab variant
    #[arg(long, value_enum, default_value = "matmul")]
    variant: Variant,

    /// Transfer policy between processor and coprocessor
    #[arg(long, value_enum, default_value = "fifo-polling")]
    transport: Transport,

    /// Decimal input file. The embedded test vector of the variant is used if omitted.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Number of test vectors sent through the coprocessor
    #[arg(long, default_value_t = 1)]
    vectors: usize,

    /// Number of packets the coprocessor splits each result into
    #[arg(long, default_value_t = 1)]
    bursts: usize,

    /// Apply the sigmoid to the hidden layer (mlp variant only)
    #[arg(long)]
    sigmoid: bool,

    /// Result delimiter style
    #[arg(long, value_enum, default_value = "newline")]
    delimiter: Delimiter,

    /// Abort on invalid input bytes instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Make the coprocessor corrupt one result word
    #[arg(long, value_name = "INDEX")]
    corrupt: Option<usize>,

    /// Spin limit for interrupt and DMA completion waits
    #[arg(long)]
    spin_limit: Option<u32>,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

static CONSOLE: StaticCell<StdoutSink> = StaticCell::new();
static SHARED: StaticCell<TransferShared> = StaticCell::new();
static ISR_HANDLER: StaticCell<Box<dyn FnMut() + Send>> = StaticCell::new();
static DISPATCHER: IrqDispatcher<'static> = IrqDispatcher::new();

impl Args {
    fn vector(&self) -> TestVector {
        match (self.variant, self.sigmoid) {
            (Variant::Lab2, _) => TestVector::LAB2,
            (Variant::Matmul, _) => TestVector::MATMUL,
            (Variant::Mlp, false) => TestVector::MLP,
            (Variant::Mlp, true) => TestVector::MLP_SIGMOID,
        }
    }

    fn coprocessor(&self, vector: &TestVector) -> SoftCoprocessor {
        let coprocessor = SoftCoprocessor::for_vector(vector).with_bursts(self.bursts);
        match self.corrupt {
            Some(index) => coprocessor.with_corrupted_result(index),
            None => coprocessor,
        }
    }

    fn config(&self, vector: &TestVector, packets: usize) -> LabConfig {
        LabConfig::new(vector.layout)
            .with_model(vector.model)
            .with_delimiter(self.delimiter.style())
            .with_invalid_bytes(if self.strict {
                InvalidBytePolicy::Reject
            } else {
                InvalidBytePolicy::Skip
            })
            .with_rx_timeout(DEFAULT_RX_TIMEOUT)
            .with_spin_limit(self.spin_limit)
            .with_test_vectors(self.vectors.max(1))
            .with_packets_per_vector(packets as u32)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = axis_coproc::console::init_with_locks(CONSOLE.init(StdoutSink), args.log_level)
    {
        eprintln!("logger setup failed: {e}");
    }
    if args.sigmoid && args.variant != Variant::Mlp {
        log::warn!("--sigmoid only applies to the mlp variant");
    }

    let vector = args.vector();
    let input = match &args.input {
        Some(path) => match std::fs::read(path) {
            Ok(input) => input,
            Err(e) => {
                log::error!("can not read {}: {e}", path.display());
                return ExitCode::from(2);
            }
        },
        None => render_input(&vector),
    };
    log::info!(
        "running {} over {:?}, {} test vectors",
        vector.name,
        args.transport,
        args.vectors.max(1)
    );

    match run(&args, &vector, &input) {
        Ok((report, results)) => {
            print_results(&results, &args, &vector);
            if let Some(speedup) = report.timing.speedup() {
                log::info!("hardware speedup: {speedup:.2}");
            }
            if report.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}

/// The embedded test vector as newline delimited decimal tokens.
fn render_input(vector: &TestVector) -> Vec<u8> {
    vector
        .input
        .iter()
        .flat_map(|element| format!("{element}\n").into_bytes())
        .collect()
}

fn run(
    args: &Args,
    vector: &TestVector,
    input: &[u8],
) -> Result<(LabReport, Vec<u32>), LabError> {
    let coprocessor = args.coprocessor(vector);
    let config = args.config(vector, coprocessor.bursts());
    match args.transport {
        Transport::FifoPolling => {
            let device = lookup(FIFO_DEVICE_ID)?;
            let fifo = SimFifo::spawn(coprocessor, device.depth, None);
            session(PollingFifo::new(fifo, config.rx_timeout())?, config, input)
        }
        Transport::FifoInterrupt => {
            let device = lookup(FIFO_DEVICE_ID)?;
            let irq: InterruptLine = Arc::new(|| {
                DISPATCHER.dispatch(IrqLine::AxiFifo);
            });
            let fifo = SimFifo::spawn(coprocessor, device.depth, Some(irq));
            let shared: &'static TransferShared = SHARED.init(TransferShared::new());
            let mut isr_fifo = fifo.clone();
            let handler = ISR_HANDLER.init(Box::new(move || shared.on_interrupt(&mut isr_fifo)));
            if let Err(e) = DISPATCHER.register(IrqLine::AxiFifo, &mut **handler) {
                log::error!("{e}");
            }
            let channel = InterruptFifo::new(
                fifo,
                shared,
                config.packets_per_vector(),
                config.spin_limit(),
            )?;
            session(channel, config, input)
        }
        Transport::Dma => {
            let device = lookup(DMA_DEVICE_ID)?;
            let dma = SimDma::new(coprocessor, device.depth as u32);
            session(DmaChannel::new(dma, config.spin_limit())?, config, input)
        }
    }
}

fn session<C: TransferChannel>(
    channel: C,
    config: LabConfig,
    input: &[u8],
) -> Result<(LabReport, Vec<u32>), LabError> {
    let mut session = LabSession::new(channel, HostCounter::new(), config);
    let mut results = vec![0; session.results_len()];
    let report = session.run_slice(input, &mut results)?;
    Ok((report, results))
}

fn print_results(results: &[u32], args: &Args, vector: &TestVector) {
    let style = args.delimiter.style();
    let mut stdout = std::io::stdout().lock();
    for response in results.chunks(vector.layout.output_words().max(1)) {
        let mut encoded: heapless::Vec<u8, 512> = heapless::Vec::new();
        if let Err(e) = encode_results(response, style, &mut encoded) {
            log::error!("{e}");
            return;
        }
        if let Err(e) = stdout.write_all(&encoded) {
            log::error!("can not write results: {e}");
            return;
        }
    }
}
