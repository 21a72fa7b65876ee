use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod batch;
mod config;
mod error;
mod form;
mod models;
mod output;
mod report;
mod scoring;
mod server;
mod session;

use crate::config::ServeArgs;
use crate::form::StudentForm;
use crate::models::StudentRecord;

#[derive(Parser)]
#[command(name = "student-appraisal")]
#[command(about = "Student performance scoring and appraisal reports", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Score a single student
    Score {
        #[arg(long)]
        attendance: String,
        #[arg(long)]
        homework_completion: String,
        #[arg(long)]
        test_scores: String,
    },
    /// Score a student and write the PDF appraisal report
    Report {
        #[command(flatten)]
        student: StudentArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Score every row of a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "scored.csv")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct StudentArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    student_id: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    attendance: String,
    #[arg(long)]
    homework_completion: String,
    #[arg(long)]
    test_scores: String,
}

impl From<StudentArgs> for StudentForm {
    fn from(args: StudentArgs) -> Self {
        StudentForm {
            name: Some(args.name),
            student_id: Some(args.student_id),
            email: Some(args.email),
            attendance: Some(args.attendance),
            homework_completion: Some(args.homework_completion),
            test_scores: Some(args.test_scores),
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Serve(args) => {
            server::run(args).await?;
        }
        Commands::Score {
            attendance,
            homework_completion,
            test_scores,
        } => {
            let outcome = scoring::score(
                form::parse_number("attendance", Some(&attendance))?,
                form::parse_number("homework_completion", Some(&homework_completion))?,
                form::parse_number("test_scores", Some(&test_scores))?,
            );
            println!(
                "Weighted percentage {}% -> {}",
                report::display_number(outcome.probability),
                if outcome.prediction { "pass" } else { "fail" }
            );
        }
        Commands::Report { student, out_dir } => {
            let record = StudentRecord::score(StudentForm::from(student).validate()?);
            println!("{}", batch::describe(&record));

            let path = write_report(&record, &out_dir, Local::now().naive_local())?;
            println!("Report written to {}.", path.display());
        }
        Commands::Batch { csv, out } => {
            let input = File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let mut pending = output::PendingFile::create(&out)?;
            let mut scored = Vec::new();
            let summary = batch::score_csv(input, &mut scored)?;
            pending.write_all(&scored)?;
            pending.commit()?;
            println!(
                "Scored {} students from {} ({} skipped), written to {}.",
                summary.scored,
                csv.display(),
                summary.skipped,
                out.display()
            );
        }
    }

    Ok(())
}

fn write_report(
    record: &StudentRecord,
    out_dir: &Path,
    generated_at: NaiveDateTime,
) -> anyhow::Result<PathBuf> {
    let pdf = report::build_report(record, generated_at)?;
    output::write_atomically(
        out_dir,
        &report::report_filename(&record.student_id, generated_at),
        &pdf,
    )
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
