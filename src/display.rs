use crate::error::Result;
use crate::manager::AttendanceManager;
use chrono::NaiveDate;
use tabled::{Table, Tabled, settings::Style};

fn render<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}

/// Pretty prints the attendance records for a given date.
pub fn show_date_attendance(manager: &AttendanceManager, date: NaiveDate) -> Result<()> {
    let attendance = manager.attendance_for_date(date)?;

    if attendance.is_empty() {
        println!("No attendance recorded on {date}.");
        return Ok(());
    }

    println!("Attendance for {date}:\n{}", render(attendance));

    Ok(())
}

/// Pretty prints the roster. The verbose form includes student IDs and classes.
pub fn show_roster(manager: &AttendanceManager, verbose: bool) -> Result<()> {
    let table = if verbose {
        render(manager.roster()?)
    } else {
        render(manager.list_students()?)
    };

    println!("Roster:\n{table}");

    Ok(())
}

/// Prints every date that has attendance records, one per line.
pub fn show_dates(manager: &AttendanceManager) -> Result<()> {
    for date in manager.list_dates()? {
        println!("{date}");
    }

    Ok(())
}

/// Prints all info about a student, including the dates they were present and absent.
pub fn show_student_info(manager: &AttendanceManager, roll_no: i64) -> Result<()> {
    let student = manager.get_student(roll_no)?;
    let attendance = manager.student_attendance(roll_no)?;

    #[derive(Tabled)]
    struct Summary {
        present: usize,
        absent: usize,
    }

    println!("Student Information:\n{}", render(vec![student]));
    println!(
        "{}",
        render(vec![Summary {
            present: attendance.present.len(),
            absent: attendance.absent.len(),
        }])
    );
    println!("Attendance:\n{:#?}", attendance);

    Ok(())
}
