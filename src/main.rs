use chrono::{Local, NaiveDate};
use clap::Parser;
use rollcall::cli::{Cli, Command};
use rollcall::manager::AttendanceManager;
use rollcall::{Result, display};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run(cli: Cli) -> Result<()> {
    let manager = match cli.database {
        Some(database_url) => AttendanceManager::new(database_url)?,
        None => rollcall::create_default_manager()?,
    };

    match cli.command {
        Command::Init => {
            manager.initialize()?;
            println!("Database ready at {}", manager.database_url());
        }
        Command::AddStudent {
            name,
            roll_no,
            class,
        } => {
            let student = manager.add_student(&name, roll_no, &class)?;
            println!(
                "Added {} (roll {}) to class {}",
                student.name, student.roll_no, student.class
            );
        }
        Command::Roster { verbose } => display::show_roster(&manager, verbose)?,
        Command::Mark {
            status,
            roll_nos,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let marked = manager.mark_many(&roll_nos, date, status)?;
            println!("Marked {marked} student(s) {status} on {date}");
        }
        Command::MarkRemainingAbsent { date } => {
            let date = date.unwrap_or_else(today);
            let marked = manager.mark_remaining_absent(date)?;
            println!("Marked {marked} student(s) Absent on {date}");
        }
        Command::View { date } => display::show_date_attendance(&manager, date)?,
        Command::Dates => display::show_dates(&manager)?,
        Command::Student { roll_no } => display::show_student_info(&manager, roll_no)?,
        Command::Import { file_path } => {
            let added = manager.import_students(&file_path)?;
            println!("Imported {added} student(s)");
        }
    }

    Ok(())
}
