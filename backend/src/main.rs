//! jupiter-reports CLI - Turn attendance exports into report tables
//!
//! # Commands
//!
//! ```bash
//! jupiter-reports serve                                  # Start HTTP server (port 3000)
//! jupiter-reports report may.xlsx -t teacher-summary    # Write 老師月統計.csv
//! jupiter-reports inspect may.xlsx                       # Show period, columns, counts
//! jupiter-reports templates                              # List report templates
//! ```

use clap::{Parser, Subcommand};
use jupiter_reports::{
    ingest_file, run_file, DashboardMetrics, IngestOptions, ServerConfig, Template,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jupiter-reports")]
#[command(about = "Generate tutoring reports from attendance and billing exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one report from a workbook or CSV export
    Report {
        /// Input .xlsx/.xls/.csv file
        input: PathBuf,

        /// Template label (e.g. 老師月統計) or slug (e.g. teacher-summary)
        #[arg(short, long)]
        template: Template,

        /// Output CSV file (default: <template label>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the rows as JSON records instead of writing CSV
        #[arg(long)]
        json: bool,
    },

    /// Show what was read from an export
    Inspect {
        /// Input .xlsx/.xls/.csv file
        input: PathBuf,
    },

    /// List report templates
    Templates,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: REPORTS_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            input,
            template,
            output,
            json,
        } => cmd_report(&input, template, output.as_deref(), json),

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Templates => cmd_templates(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_report(
    input: &Path,
    template: Template,
    output: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let result = run_file(input, template, &IngestOptions::default())?;
    let report = &result.report;

    if json {
        let records = serde_json::to_string_pretty(&report.table.to_records())?;
        println!("{}", records);
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(report.file_name()));
    fs::write(&path, &result.csv)?;

    eprintln!("\n📦 {}: {} rows", report.template, report.table.len());
    eprintln!("   💾 Saved to: {}", path.display());
    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let upload = ingest_file(input, &IngestOptions::default())?;
    let source = &upload.source;

    println!("\n📄 {}", input.display());
    if let Some(ref sheet) = source.sheet {
        println!("   Sheet:     {}", sheet);
    }
    if let Some(ref encoding) = source.encoding {
        println!("   Encoding:  {}", encoding);
    }
    println!(
        "   Period:    {}",
        if upload.period.is_empty() { "-" } else { upload.period.as_str() }
    );
    println!("   Rows:      {}", source.row_count);
    println!("   Columns:   {}", source.headers.join(", "));
    print_metrics(&upload.metrics);

    let available = jupiter_reports::validation::available_templates(&upload.table);
    println!("\n📋 Templates ({} of {} available):", available.len(), Template::ALL.len());
    for template in Template::ALL {
        if available.contains(&template) {
            println!("   ✓ {}", template);
        } else {
            let missing = jupiter_reports::validation::missing_columns(&upload.table, template);
            println!("   ✗ {} (missing: {})", template, missing.join(", "));
        }
    }
    Ok(())
}

fn print_metrics(metrics: &DashboardMetrics) {
    let show = |count: Option<usize>| count.map_or_else(|| "-".to_string(), |n| n.to_string());
    println!("\n📊 Overview:");
    println!("   Students:  {}", show(metrics.total_students));
    println!("   Teachers:  {}", show(metrics.total_teachers));
    println!("   Grades:    {}", show(metrics.total_grades));
}

fn cmd_templates() -> Result<(), Box<dyn std::error::Error>> {
    for template in Template::ALL {
        println!("  📄 {} ({})", template.label(), template.slug());
        println!("     Requires: {}", template.required_columns().join(", "));
        if !template.optional_columns().is_empty() {
            println!("     Optional: {}", template.optional_columns().join(", "));
        }
        println!("     Output:   {}", template.output_columns().join(", "));
        if template.uses_period() {
            println!("     Carries the period (月份)");
        }
        println!();
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    jupiter_reports::server::start_server(config).await
}
