//! plank: CLI tool for inspecting, probing and benchmarking plank modules
//!
//! Runs modules without a host, straight from a patch JSON file:
//!
//! - `list`: registered module types
//! - `schema`: module configuration surfaces, or the patch file JSON Schema
//! - `probe`: print per-sample outputs and lights
//! - `bench`: time the processing loop
//!
//! Usage:
//!   plank list
//!   plank probe demos/planky_chord.json --frames 64
//!   plank bench demos/planky_chord.json --frames 4800000

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use plank_core::config::patch_file_schema;
use plank_core::dsp::{consts::DEFAULT_SAMPLE_RATE, schemas};
use plank_core::{Patch, PatchFile};
use serde::Serialize;
use std::hint::black_box;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_BENCH_FRAMES: u64 = DEFAULT_SAMPLE_RATE as u64 * 10; // 10 seconds at 48kHz

/// Inspect and exercise plank oscillator modules
#[derive(Parser)]
#[command(name = "plank")]
#[command(about = "Inspect, probe and benchmark plank oscillator modules")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered module types
    List,

    /// Print module schemas as JSON
    Schema {
        /// Only this module type
        module_type: Option<String>,

        /// Print the patch file JSON Schema instead
        #[arg(long)]
        patch_format: bool,
    },

    /// Run a patch and print every frame's outputs and lights
    Probe {
        /// Path to the patch JSON file
        patch: PathBuf,

        /// Number of frames to print
        #[arg(short, long, default_value_t = 32)]
        frames: u64,

        /// Only this module id
        #[arg(short, long)]
        module: Option<String>,
    },

    /// Time the processing loop for a patch
    Bench {
        /// Path to the patch JSON file
        patch: PathBuf,

        /// Number of audio frames to process
        #[arg(short, long, default_value_t = DEFAULT_BENCH_FRAMES)]
        frames: u64,

        /// Warmup frames before measurement
        #[arg(short, long, default_value_t = 48000)]
        warmup: u64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeFrame<'a> {
    frame: u64,
    module_id: &'a str,
    outputs: &'a [f32],
    lights: &'a [f32],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BenchReport {
    frames: u64,
    modules: usize,
    sample_rate: f32,
    elapsed_ns: u128,
    ns_per_frame: f64,
    realtime_factor: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => cmd_list(cli.format),
        Commands::Schema {
            module_type,
            patch_format,
        } => cmd_schema(module_type.as_deref(), patch_format),
        Commands::Probe {
            patch,
            frames,
            module,
        } => cmd_probe(&patch, frames, module.as_deref(), cli.format),
        Commands::Bench {
            patch,
            frames,
            warmup,
        } => cmd_bench(&patch, frames, warmup, cli.format),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_patch(path: &PathBuf) -> Result<Patch> {
    let file = PatchFile::load(path)?;
    file.build()
        .with_context(|| format!("failed to build patch {}", path.display()))
}

fn cmd_list(format: OutputFormat) -> Result<()> {
    for schema in schemas() {
        match format {
            OutputFormat::Table => println!(
                "{:<10} {} voice(s)  {}",
                schema.name.cyan(),
                schema.voices,
                schema.description.dimmed()
            ),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "name": schema.name,
                    "description": schema.description,
                })
            ),
        }
    }
    Ok(())
}

fn cmd_schema(module_type: Option<&str>, patch_format: bool) -> Result<()> {
    if patch_format {
        println!("{}", serde_json::to_string_pretty(&patch_file_schema())?);
        return Ok(());
    }

    let selected: Vec<_> = schemas()
        .into_iter()
        .filter(|s| module_type.is_none_or(|t| s.name == t))
        .collect();
    if selected.is_empty() {
        return Err(anyhow!(
            "unknown module type '{}'",
            module_type.unwrap_or_default()
        ));
    }
    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}

fn format_volts(v: f32) -> String {
    let text = format!("{:+.4}", v);
    if v > 0.0 {
        text.green().to_string()
    } else if v < 0.0 {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

fn cmd_probe(
    path: &PathBuf,
    frames: u64,
    module: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let mut patch = load_patch(path)?;
    if let Some(id) = module {
        if patch.get(id).is_none() {
            return Err(anyhow!("patch has no module with id '{}'", id));
        }
    }

    for frame in 0..frames {
        patch.process_frame();
        for instance in patch.instances() {
            if module.is_some_and(|id| id != instance.id()) {
                continue;
            }
            match format {
                OutputFormat::Table => {
                    let outputs: Vec<String> =
                        instance.io.outputs().iter().map(|&v| format_volts(v)).collect();
                    let lights: Vec<String> = instance
                        .io
                        .lights()
                        .iter()
                        .map(|&l| {
                            if l > 0.5 {
                                "●".yellow().to_string()
                            } else {
                                "○".dimmed().to_string()
                            }
                        })
                        .collect();
                    println!(
                        "{:>8} {:>10}  {}  {}",
                        frame.to_string().dimmed(),
                        instance.id().cyan(),
                        outputs.join(" "),
                        lights.join("")
                    );
                }
                OutputFormat::Json => {
                    let row = ProbeFrame {
                        frame,
                        module_id: instance.id(),
                        outputs: instance.io.outputs(),
                        lights: instance.io.lights(),
                    };
                    println!("{}", serde_json::to_string(&row)?);
                }
            }
        }
    }
    Ok(())
}

fn cmd_bench(path: &PathBuf, frames: u64, warmup: u64, format: OutputFormat) -> Result<()> {
    let mut patch = load_patch(path)?;
    tracing::info!(
        modules = patch.len(),
        sample_rate = patch.sample_rate(),
        frames,
        warmup,
        "benchmarking {}",
        path.display()
    );

    for _ in 0..warmup {
        patch.process_frame();
    }

    let start = Instant::now();
    for _ in 0..frames {
        profiling::scope!("bench_frame");
        patch.process_frame();
    }
    let elapsed = start.elapsed();
    black_box(patch.instances().first().map(|i| i.io.output(0)));

    let ns_per_frame = elapsed.as_nanos() as f64 / frames.max(1) as f64;
    let frame_budget_ns = 1e9 / patch.sample_rate() as f64;
    let report = BenchReport {
        frames,
        modules: patch.len(),
        sample_rate: patch.sample_rate(),
        elapsed_ns: elapsed.as_nanos(),
        ns_per_frame,
        realtime_factor: frame_budget_ns / ns_per_frame.max(f64::MIN_POSITIVE),
    };

    match format {
        OutputFormat::Table => {
            println!("{}", "-".repeat(60));
            println!("frames          {}", report.frames);
            println!("modules         {}", report.modules);
            println!("elapsed         {:.2?}", elapsed);
            println!(
                "per frame       {}",
                format!("{:.1}ns", report.ns_per_frame).yellow()
            );
            println!(
                "realtime        {}",
                format!("{:.1}x", report.realtime_factor).green()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
    }
    Ok(())
}
