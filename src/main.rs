use clap::Parser;
use shop_detect::{Detector, DetectorConfig, tabular};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::time::Duration;

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    };

    let mut detector = Detector::new(config);
    if let Some(concurrency) = args.concurrency {
        detector = detector.with_max_concurrency(concurrency);
    }
    if let Some(secs) = args.timeout {
        detector = detector.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = args.total_timeout {
        detector = detector.with_total_timeout(Duration::from_secs(secs));
    }

    // Configuration problems stop here, before any request is made
    let runner = detector.build()?;

    let urls = tabular::read_urls(BufReader::new(File::open(&args.input)?))?;
    ::log::info!("Read {} URLs from {}", urls.len(), args.input.display());

    let records = runner.run(urls).await;

    match &args.output {
        Some(path) => write_records(BufWriter::new(File::create(path)?), args.format, &records)?,
        None => write_records(io::stdout().lock(), args.format, &records)?,
    }

    Ok(())
}

fn write_records<W: io::Write>(
    writer: W,
    format: OutputFormat,
    records: &[shop_detect::ResultRecord],
) -> io::Result<()> {
    match format {
        OutputFormat::Tsv => tabular::write_tsv(writer, records),
        OutputFormat::Json => tabular::write_json(writer, records),
    }
}
