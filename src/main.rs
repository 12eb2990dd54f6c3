//! Command line front-end for running pipelines over CSV files.
//!
//! ```bash
//! tidyrs run --pipeline cases.yaml --input cases.csv --output totals.csv
//! tidyrs show --input cases.csv --rows 5
//! tidyrs check --pipeline cases.yaml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tidyrs::io::{read_csv, CsvOptions};
use tidyrs::pipeline::{run_pipeline, PipelineSpec};

#[derive(Parser)]
#[command(name = "tidyrs", version, about = "Tidy-data pipelines over CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Field delimiter for CSV input
    #[arg(long, default_value_t = ',', global = true)]
    delimiter: char,

    /// Read every column as text instead of inferring types
    #[arg(long, global = true)]
    no_infer: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline spec over a CSV file
    Run {
        /// Pipeline spec (JSON, YAML or TOML)
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the result; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the first rows of a CSV file
    Show {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of rows to print
        #[arg(short, long, default_value_t = 10)]
        rows: usize,
    },
    /// Validate a pipeline spec without running it
    Check {
        /// Pipeline spec (JSON, YAML or TOML)
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

impl Cli {
    fn csv_options(&self) -> tidyrs::Result<CsvOptions> {
        let delimiter = u8::try_from(self.delimiter).map_err(|_| {
            tidyrs::Error::InvalidInput(format!(
                "delimiter must be a single-byte character, got {:?}",
                self.delimiter
            ))
        })?;
        Ok(CsvOptions {
            delimiter,
            infer_types: !self.no_infer,
            ..CsvOptions::default()
        })
    }
}

fn execute(cli: &Cli) -> tidyrs::Result<()> {
    let options = cli.csv_options()?;

    match &cli.command {
        Commands::Run {
            pipeline,
            input,
            output,
        } => {
            let spec = PipelineSpec::from_file(pipeline)?;
            let (result, report) = run_pipeline(&spec, input, output.as_ref(), &options)?;
            if output.is_none() {
                println!("{}", result);
            }
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            eprintln!("{}", report.summary());
        }
        Commands::Show { input, rows } => {
            let df = read_csv(input, &options)?;
            println!("{}", df.head(*rows));
        }
        Commands::Check { pipeline } => {
            let spec = PipelineSpec::from_file(pipeline)?;
            spec.validate()?;
            println!("`{}`: {} steps OK", spec.name, spec.steps.len());
            for (index, step) in spec.steps.iter().enumerate() {
                println!("  {}. {}", index + 1, step);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
