use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use oms_api::{EventSink, OmsEvent, Side, Symbol};
use order_engine::engine::{Quote, ShardedOms, SinkFactory};
use order_engine::events::{run_event_writer, ChannelSink, LogSink};
use order_engine::gateway::{FileGateway, Gateway, ReplayGateway};
use order_engine::io::{fix, Args};
use order_engine::models::OmsConfig;
use std::collections::BTreeSet;

/// Replayed when no --input file is given: a short session touching every
/// message type, including lines the decoder must refuse.
const DEMO_SESSION: &[&str] = &[
    "# new orders",
    "8=FIX.4.2|35=D|49=BLUE|56=OMS|34=1|11=C-1001|55=AAPL|54=1|38=100|40=2|44=189.50",
    "35=D|11=C-1002|55=AAPL|54=1|38=200|40=2|44=189.40",
    "35=D|11=C-1003|55=AAPL|54=2|38=150|40=2|44=190.10",
    "35=D|11=C-1004|55=MSFT|54=1|38=1500|40=2|44=401.25",
    "35=D|11=C-1005|55=MSFT|54=1|38=350|40=2|44=402.00",
    "35=D|11=C-1006|55=AAPL|54=1|38=50|40=2|44=189.25",
    "# replace C-1005 before it fills",
    "35=G|55=MSFT|41=C-1005|38=400|44=401.80",
    "# executions and a cancel",
    "35=8|55=AAPL|11=C-1001|39=2",
    "35=8|55=AAPL|11=C-1002|39=2",
    "35=8|55=AAPL|11=C-1003|39=2",
    "35=F|55=AAPL|41=C-1006",
    "35=8|55=MSFT|11=C-1005|39=2",
    "# traffic the pipeline must survive",
    "35=D|11=C-1007|55=AAPL|54=3|38=10|40=2|44=189.00",
    "35=D|11=C-1008|54=1|38=10|40=2|44=189.00",
    "35=A|49=BLUE|56=OMS|34=2",
    "35=8|55=AAPL|37=99|39=2",
    "# one order left resting",
    "35=D|11=C-1009|55=AAPL|54=2|38=75|40=2|44=190.30",
];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = OmsConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    info!(
        "order engine starting: {} shard(s), {} book, limits {:?}",
        config.shards, config.book, config.risk
    );

    let (sink_factory, pipeline_sink, writer) = match &config.event_log {
        Some(path) => {
            let (channel, rx) = ChannelSink::new();
            let writer = tokio::spawn(run_event_writer(rx, path.clone()));
            let factory_sink = channel.clone();
            let factory: SinkFactory =
                Box::new(move || Box::new(factory_sink.clone()) as Box<dyn EventSink>);
            let pipeline: Box<dyn EventSink> = Box::new(channel);
            (factory, pipeline, Some(writer))
        }
        None => {
            let log = LogSink::new();
            let factory_sink = log.clone();
            let factory: SinkFactory =
                Box::new(move || Box::new(factory_sink.clone()) as Box<dyn EventSink>);
            let pipeline: Box<dyn EventSink> = Box::new(log);
            (factory, pipeline, None)
        }
    };

    let oms = ShardedOms::new(config.shards, config.book, config.risk.clone(), sink_factory);

    let mut gateway: Box<dyn Gateway> = match &args.input {
        Some(path) => Box::new(FileGateway::open(path)?),
        None => {
            info!("no input file; replaying the built-in demo session");
            Box::new(ReplayGateway::from_static(DEMO_SESSION))
        }
    };

    let mut applied = 0u64;
    let mut ignored = 0u64;
    let mut decode_errors = 0u64;
    let mut symbols: BTreeSet<Symbol> = BTreeSet::new();

    while let Some(line) = gateway.next_line() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match fix::decode_line(line) {
            Ok(Some(msg)) => {
                if let Some(symbol) = msg.symbol() {
                    symbols.insert(symbol.clone());
                }
                oms.apply(msg);
                applied += 1;
            }
            Ok(None) => ignored += 1,
            Err(e) => {
                warn!("undecodable line dropped: {e}");
                pipeline_sink.emit(OmsEvent::Error {
                    detail: format!("decode: {e}"),
                    fatal: false,
                });
                decode_errors += 1;
            }
        }
    }

    info!("session drained: {applied} applied, {ignored} ignored, {decode_errors} undecodable");
    print_summary(&oms, &symbols, decode_errors, ignored);

    oms.shutdown();
    drop(pipeline_sink);
    if let Some(writer) = writer {
        let written = writer.await??;
        info!("event log complete: {written} record(s)");
    }
    Ok(())
}

fn print_summary(oms: &ShardedOms, symbols: &BTreeSet<Symbol>, decode_errors: u64, ignored: u64) {
    let report = oms.snapshot();
    println!("==== session summary ====");
    println!(
        "orders: {} resting, {} filled, {} canceled, {} rejected",
        report.counts.acked, report.counts.filled, report.counts.canceled, report.counts.rejected
    );
    println!("decode errors: {decode_errors}, ignored messages: {ignored}");
    for symbol in symbols {
        let position = report.positions.get(symbol).copied().unwrap_or(0);
        println!(
            "{symbol}: position {position:+}, best bid {}, best ask {}",
            quote_line(oms.best(symbol, Side::Buy)),
            quote_line(oms.best(symbol, Side::Sell))
        );
    }
    for symbol in &report.halted {
        println!("{symbol}: HALTED");
    }
}

fn quote_line(quote: Option<Quote>) -> String {
    match quote {
        Some(quote) => format!("{} x {:.2}", quote.quantity, quote.price),
        None => "-".to_string(),
    }
}
