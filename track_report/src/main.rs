use std::{fs::File, path::PathBuf};

use plt::{Coordinate, Parser};
use timestamp::{LocalZone, SystemZone, TimestampCodec};
use tracing_subscriber::EnvFilter;

use crate::{
    report::{SegmentRecord, delta_line, write_csv},
    viewport::{Canvas, fit_to_canvas},
};

mod report;
mod viewport;

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// Input plt file location
    #[arg(default_value_os_t = std::env::current_dir().unwrap_or_default().join("data").join("data.plt"), required = false)]
    pub input: PathBuf,
    /// Subtract the reference offset, producing true UTC epoch times
    #[arg(short, long, default_value_t = false, required = false)]
    pub utc: bool,
    /// Fixed zone as `±hh:mm` instead of the system zone
    #[arg(short, long, allow_hyphen_values = true)]
    pub offset: Option<String>,
    /// Skip malformed lines instead of failing the whole file
    #[arg(short, long, default_value_t = false, required = false)]
    pub lenient: bool,
    /// Wrap longitudes into [-180, 180) before measuring
    #[arg(short, long, default_value_t = false, required = false)]
    pub normalize: bool,
    /// Output csv file with one row per segment. _Note_: will truncate old file if exists
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Print every segment to stdout
    #[arg(short, long, default_value_t = false, required = false)]
    pub print: bool,
    /// Side of the square preview canvas in pixels
    #[arg(long, default_value_t = 800, required = false)]
    pub canvas: u32,
    /// Canvas margin in pixels
    #[arg(long, default_value_t = 25, required = false)]
    pub padding: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = <Args as clap::Parser>::parse();

    match args.offset.as_deref() {
        Some(offset) => {
            let offset = timestamp::parse_utc_offset(offset)
                .map_err(|e| format!("Invalid offset. Reason: {e}"))?;

            run(&args, TimestampCodec::fixed(offset))
        }
        None => {
            let codec = TimestampCodec::new(SystemZone)
                .map_err(|e| format!("Failed to read system zone. Reason: {e}"))?;

            run(&args, codec)
        }
    }
}

fn run<Z: LocalZone>(
    args: &Args,
    codec: TimestampCodec<Z>,
) -> Result<(), Box<dyn std::error::Error>> {
    let parser = Parser::new(codec).set_to_utc(args.utc);

    let coordinates = match args.lenient {
        true => parser.parse_lenient(&args.input).map(|this| {
            if !this.rejected.is_empty() {
                println!("Rejected: {} lines", this.rejected.len());
            }
            this.coordinates
        }),
        false => parser.parse(&args.input),
    }
    .inspect_err(|_| tracing::error!("cannot parse track file {}", args.input.display()))
    .map_err(|e| format!("Failed to parse track. Reason: {e}"))?;

    let coordinates = match args.normalize {
        true => coordinates.into_iter().map(geodesy::normalized).collect(),
        false => coordinates,
    };

    let segments = geodesy::segments(&coordinates);

    if args.print {
        for segment in &segments {
            println!("{}", delta_line(segment));
        }
    }

    println!("Total: {} records", coordinates.len());
    println!("Distance: {:.2}m", geodesy::total_distance(&coordinates));

    if let (Some(first), Some(last)) = (coordinates.first(), coordinates.last()) {
        println!(
            "Span: {} .. {}",
            parser.codec().format_datetime(first.time, args.utc)?,
            parser.codec().format_datetime(last.time, args.utc)?
        );
    }

    preview(&coordinates, Canvas::new(args.canvas, args.canvas, args.padding));

    if let Some(output) = &args.output {
        let records = segments
            .iter()
            .map(|segment| SegmentRecord::new(segment, parser.codec(), args.utc))
            .collect::<Result<Vec<_>, _>>()?;

        write_csv(
            File::create(output).map_err(|e| format!("Failed to create output file. Reason: {e}"))?,
            &records,
        )
        .map_err(|e| format!("Failed to write output file. Reason: {e}"))?;

        tracing::info!(rows = records.len(), "report saved to {}", output.display());
    }

    println!("Done!");

    Ok(())
}

fn preview(coordinates: &[Coordinate], canvas: Canvas) {
    let fit = fit_to_canvas(coordinates, canvas);

    if let (Some(first), Some(last)) = (fit.points.first(), fit.points.last()) {
        println!(
            "Canvas {}px: start ({:.1}, {:.1}) end ({:.1}, {:.1}), {:.2} x {:.2} m/px",
            canvas.width,
            first.x,
            first.y,
            last.x,
            last.y,
            fit.meters_per_pixel.0,
            fit.meters_per_pixel.1
        );
    }
}
