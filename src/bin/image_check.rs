use anyhow::Context;
use clap::Parser;
use echo_server::packaging::{inspect_path, InspectOptions, Severity};
use echo_server::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-check")]
#[command(about = "Checks a Dockerfile against its build context")]
struct Args {
    /// Path to the Dockerfile
    #[arg(short, long, default_value = "Dockerfile")]
    file: PathBuf,

    /// Build context directory (defaults to the Dockerfile's directory)
    #[arg(short, long)]
    context: Option<PathBuf>,

    /// Environment variables naming the entry-point file
    #[arg(long = "entrypoint-var", value_delimiter = ',', default_value = "FLASK_APP")]
    entrypoint_vars: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let context = args.context.clone().unwrap_or_else(|| {
        args.file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    tracing::info!(
        "🔍 Inspecting {} with build context {}",
        args.file.display(),
        context.display()
    );

    let options = InspectOptions {
        entrypoint_vars: args.entrypoint_vars.clone(),
    };
    let report = inspect_path(&args.file, &context, &options)
        .with_context(|| format!("failed to inspect {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for finding in &report.findings {
            match finding.severity {
                Severity::Error => tracing::error!("{:?}: {}", finding.kind, finding.message),
                Severity::Warning => tracing::warn!("{:?}: {}", finding.kind, finding.message),
            }
            println!("{}", finding);
        }
        println!(
            "{} error(s), {} warning(s); bound ports [{}], exposed ports [{}]",
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report
                .bound_ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            report.exposed_ports.join(", ")
        );
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
