//! This module contains the command-line interface [`Cli`] parser for recording students and their
//! daily attendance.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::Status;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about = "Record students and their daily attendance")]
pub struct Cli {
    /// Path to the SQLite database, overriding `config.toml` and `DATABASE_URL`.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// The different commands available for managing attendance records.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database tables if they do not exist.
    Init,

    /// Add a new student to the roster.
    AddStudent {
        #[arg(long)]
        name: String,

        #[arg(long)]
        roll_no: i64,

        #[arg(long)]
        class: String,
    },

    /// Show the roster.
    Roster {
        /// Include student IDs and classes.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Mark the given students with a status. Defaults to today.
    Mark {
        status: Status,

        #[arg(required = true)]
        roll_nos: Vec<i64>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Mark every student without a record as absent. Defaults to today.
    MarkRemainingAbsent {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show attendance for a date (YYYY-MM-DD).
    View { date: NaiveDate },

    /// List every date with attendance records.
    Dates,

    /// Show a student's details and attendance history.
    Student { roll_no: i64 },

    /// Add every student from a CSV roster with columns `name,roll_no,class`.
    Import { file_path: PathBuf },
}
