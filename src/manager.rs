use crate::error::{Error, Result};
use crate::models::{
    AttendanceEntry, NewAttendance, NewStudent, RosterEntry, Status, Student, StudentAttendance,
};
use crate::roster;
use crate::schema::{attendance, students};
use crate::settings::Settings;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Creates both tables if they do not exist yet.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS students (
        student_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        roll_no INTEGER NOT NULL UNIQUE,
        class TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS attendance (
        attendance_id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        status TEXT NOT NULL,
        FOREIGN KEY (student_id) REFERENCES students (student_id)
    );
";

/// The manager for recording and retrieving students and their attendance.
///
/// The manager does not hold a connection. Every operation opens its own connection to the
/// `sqlite3` file, commits, and closes it before returning.
#[derive(Debug, Clone)]
pub struct AttendanceManager {
    database_url: String,
}

impl AttendanceManager {
    /// Creates a new `AttendanceManager` backed by the `sqlite3` file at `database_url`, creating
    /// the file, its parent directory, and the schema if they are missing.
    pub fn new(database_url: impl Into<String>) -> Result<Self> {
        let database_url = database_url.into();

        if let Some(parent) = Path::new(&database_url)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| storage_unavailable(&database_url, err))?;
        }

        let manager = Self { database_url };
        manager.initialize()?;

        Ok(manager)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.database_url.as_str())
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn connect(&self) -> Result<SqliteConnection> {
        let mut connection = SqliteConnection::establish(&self.database_url)
            .map_err(|err| storage_unavailable(&self.database_url, err))?;
        connection
            .batch_execute("PRAGMA foreign_keys = ON")
            .map_err(|err| storage_unavailable(&self.database_url, err))?;

        Ok(connection)
    }

    /// Ensures the `students` and `attendance` tables exist. Calling this on an initialized
    /// database does nothing.
    ///
    /// Fails with [`Error::StorageUnavailable`] if the file cannot be opened as a database or
    /// cannot be written.
    pub fn initialize(&self) -> Result<()> {
        self.connect()?
            .batch_execute(SCHEMA)
            .map_err(|err| storage_unavailable(&self.database_url, err))?;
        debug!(database = %self.database_url, "schema ready");

        Ok(())
    }

    /// Adds a student to the roster and returns the stored row.
    ///
    /// `name` and `class` are trimmed and must not be empty. Fails with
    /// [`Error::DuplicateRollNo`] if another student already has `roll_no`.
    pub fn add_student(&self, name: &str, roll_no: i64, class: &str) -> Result<Student> {
        let name = required("name", name)?;
        let class = required("class", class)?;

        let mut connection = self.connect()?;

        let student = diesel::insert_into(students::table)
            .values(NewStudent {
                name,
                roll_no,
                class,
            })
            .returning(Student::as_returning())
            .get_result(&mut connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    warn!(roll_no, "roll number already taken");
                    Error::DuplicateRollNo(roll_no)
                }
                other => Error::Db(other),
            })?;

        info!(student_id = student.student_id, roll_no, "added student");

        Ok(student)
    }

    /// Returns the name and roll number of every student, in the order they were added.
    pub fn list_students(&self) -> Result<Vec<RosterEntry>> {
        let mut connection = self.connect()?;

        let entries = students::table
            .select((students::name, students::roll_no))
            .order(students::student_id.asc())
            .load::<RosterEntry>(&mut connection)?;

        debug!(count = entries.len(), "listed students");

        Ok(entries)
    }

    /// Retrieves every student on the roster, in the order they were added.
    pub fn roster(&self) -> Result<Vec<Student>> {
        let mut connection = self.connect()?;

        Ok(students::table
            .select(Student::as_select())
            .order(students::student_id.asc())
            .load(&mut connection)?)
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&self) -> Result<usize> {
        let mut connection = self.connect()?;

        students::table
            .count()
            .get_result(&mut connection)
            .map(|count: i64| count as usize)
            .map_err(Error::from)
    }

    /// Retrieves a specific student based on their roll number.
    pub fn get_student(&self, roll_no: i64) -> Result<Student> {
        let mut connection = self.connect()?;

        students::table
            .filter(students::roll_no.eq(roll_no))
            .select(Student::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or(Error::StudentNotFound(roll_no))
    }

    /// Records `status` for the student with `roll_no` on `date`. If that student already has a
    /// record for `date`, its status is overwritten.
    pub fn mark_attendance(&self, roll_no: i64, date: NaiveDate, status: Status) -> Result<()> {
        let mut connection = self.connect()?;

        connection.transaction::<_, Error, _>(|conn| {
            let student_id = find_student_id(conn, roll_no)?;

            let existing = attendance::table
                .filter(attendance::student_id.eq(student_id))
                .filter(attendance::date.eq(date))
                .select(attendance::attendance_id)
                .first::<i32>(conn)
                .optional()?;

            match existing {
                Some(attendance_id) => {
                    diesel::update(attendance::table.find(attendance_id))
                        .set(attendance::status.eq(status))
                        .execute(conn)?;
                }
                None => {
                    diesel::insert_into(attendance::table)
                        .values(NewAttendance {
                            student_id,
                            date,
                            status,
                        })
                        .execute(conn)?;
                }
            }

            info!(roll_no, %date, %status, updated = existing.is_some(), "marked attendance");

            Ok(())
        })
    }

    /// Marks every student in `roll_nos` with `status` on `date`, returning how many distinct
    /// students were marked. A roll number listed more than once is marked once.
    ///
    /// Each student is committed on its own. The first failure is returned, and students marked
    /// before it stay marked.
    pub fn mark_many(&self, roll_nos: &[i64], date: NaiveDate, status: Status) -> Result<usize> {
        let mut seen = HashSet::new();

        for &roll_no in roll_nos {
            if seen.insert(roll_no) {
                self.mark_attendance(roll_no, date, status)?;
            }
        }

        Ok(seen.len())
    }

    /// For a given date, marks every student who has no record yet as [`Status::Absent`].
    /// Existing records are left alone.
    ///
    /// Returns the number of students that were marked absent.
    pub fn mark_remaining_absent(&self, date: NaiveDate) -> Result<usize> {
        let mut connection = self.connect()?;

        connection.transaction::<_, Error, _>(|conn| {
            let marked: Vec<i32> = attendance::table
                .filter(attendance::date.eq(date))
                .select(attendance::student_id)
                .load(conn)?;

            let records: Vec<NewAttendance> = students::table
                .select(students::student_id)
                .order(students::student_id.asc())
                .load::<i32>(conn)?
                .into_iter()
                .filter(|student_id| !marked.contains(student_id))
                .map(|student_id| NewAttendance {
                    student_id,
                    date,
                    status: Status::Absent,
                })
                .collect();

            if records.is_empty() {
                return Ok(0);
            }

            let inserted = diesel::insert_into(attendance::table)
                .values(&records)
                .execute(conn)?;

            info!(%date, inserted, "marked remaining students absent");

            Ok(inserted)
        })
    }

    /// Returns every record on `date` with the name and roll number of its student, in the order
    /// the records were first created.
    pub fn attendance_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceEntry>> {
        let mut connection = self.connect()?;

        let entries = attendance::table
            .inner_join(students::table)
            .filter(attendance::date.eq(date))
            .order(attendance::attendance_id.asc())
            .select((students::name, students::roll_no, attendance::status))
            .load::<AttendanceEntry>(&mut connection)?;

        debug!(%date, count = entries.len(), "loaded attendance");

        Ok(entries)
    }

    /// Returns each date that has at least one record, earliest first.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut connection = self.connect()?;

        Ok(attendance::table
            .select(attendance::date)
            .distinct()
            .order(attendance::date.asc())
            .load(&mut connection)?)
    }

    /// Retrieves a student's attendance over every recorded date.
    pub fn student_attendance(&self, roll_no: i64) -> Result<StudentAttendance> {
        let mut connection = self.connect()?;

        let student_id = find_student_id(&mut connection, roll_no)?;

        let records = attendance::table
            .filter(attendance::student_id.eq(student_id))
            .order(attendance::date.asc())
            .select((attendance::date, attendance::status))
            .load::<(NaiveDate, Status)>(&mut connection)?;

        let mut history = StudentAttendance::default();
        for (date, status) in records {
            match status {
                Status::Present => history.present.push(date),
                Status::Absent => history.absent.push(date),
            }
        }

        Ok(history)
    }

    /// Adds every student listed in the CSV roster at `path`, returning how many were added.
    ///
    /// The whole file is parsed before anything is written. Students are then added one at a
    /// time, and the first rejected student stops the import with earlier students kept.
    pub fn import_students(&self, path: impl AsRef<Path>) -> Result<usize> {
        let records = roster::read_roster(path)?;

        let parsed = records
            .iter()
            .map(|record| -> Result<(&str, i64, &str)> {
                Ok((record.name.as_str(), record.roll_no()?, record.class.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;

        for (name, roll_no, class) in &parsed {
            self.add_student(name, *roll_no, class)?;
        }

        info!(count = parsed.len(), "imported roster");

        Ok(parsed.len())
    }
}

fn storage_unavailable(
    database: &str,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> Error {
    let source = source.into();
    warn!(database, error = %source, "storage unavailable");

    Error::StorageUnavailable {
        database: database.to_string(),
        source,
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!(field, "rejected empty field");
        return Err(Error::EmptyField(field));
    }

    Ok(trimmed)
}

fn find_student_id(conn: &mut SqliteConnection, roll_no: i64) -> Result<i32> {
    students::table
        .filter(students::roll_no.eq(roll_no))
        .select(students::student_id)
        .first::<i32>(conn)
        .optional()?
        .ok_or(Error::StudentNotFound(roll_no))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, AttendanceManager) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attendance.db");
        let manager = AttendanceManager::new(path.to_str().unwrap()).unwrap();
        (dir, manager)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();

        manager.initialize().unwrap();
        let reopened = AttendanceManager::new(manager.database_url()).unwrap();

        assert_eq!(reopened.num_students().unwrap(), 1);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("school.db");

        AttendanceManager::new(path.to_str().unwrap()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn add_student_trims_and_returns_row() {
        let (_dir, manager) = manager();

        let student = manager.add_student("  Alice ", 101, " 10A").unwrap();

        assert_eq!(student.name, "Alice");
        assert_eq!(student.class, "10A");
        assert_eq!(student.roll_no, 101);
        assert_eq!(manager.get_student(101).unwrap(), student);
    }

    #[test]
    fn add_student_rejects_empty_fields() {
        let (_dir, manager) = manager();

        assert!(matches!(
            manager.add_student("", 1, "10A"),
            Err(Error::EmptyField("name"))
        ));
        assert!(matches!(
            manager.add_student("Alice", 1, "   "),
            Err(Error::EmptyField("class"))
        ));
        assert_eq!(manager.num_students().unwrap(), 0);
    }

    #[test]
    fn student_ids_are_distinct() {
        let (_dir, manager) = manager();

        let a = manager.add_student("Alice", 101, "10A").unwrap();
        let b = manager.add_student("Bob", 102, "10A").unwrap();

        assert_ne!(a.student_id, b.student_id);
    }

    #[test]
    fn get_student_unknown_roll_no() {
        let (_dir, manager) = manager();

        assert!(matches!(
            manager.get_student(5),
            Err(Error::StudentNotFound(5))
        ));
    }

    #[test]
    fn mark_attendance_unknown_student_writes_nothing() {
        let (_dir, manager) = manager();

        let result = manager.mark_attendance(999, day("2024-01-01"), Status::Present);

        assert!(matches!(result, Err(Error::StudentNotFound(999))));
        assert!(manager.list_dates().unwrap().is_empty());
    }

    #[test]
    fn mark_many_keeps_marks_before_failure() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();
        manager.add_student("Bob", 102, "10A").unwrap();
        let date = day("2024-01-01");

        let result = manager.mark_many(&[101, 555, 102], date, Status::Present);

        assert!(matches!(result, Err(Error::StudentNotFound(555))));
        let entries = manager.attendance_for_date(date).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].roll_no, 101);
    }

    #[test]
    fn mark_many_counts_repeated_roll_no_once() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();
        manager.add_student("Bob", 102, "10A").unwrap();
        let date = day("2024-01-01");

        let marked = manager
            .mark_many(&[101, 101, 102, 101], date, Status::Present)
            .unwrap();

        assert_eq!(marked, 2);
        assert_eq!(manager.attendance_for_date(date).unwrap().len(), 2);
    }

    #[test]
    fn storage_errors_report_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let nested = blocker.join("attendance.db");
        assert!(matches!(
            AttendanceManager::new(nested.to_str().unwrap()),
            Err(Error::StorageUnavailable { .. })
        ));

        let corrupt = dir.path().join("corrupt.db");
        std::fs::write(&corrupt, vec![0x5a_u8; 4096]).unwrap();
        assert!(matches!(
            AttendanceManager::new(corrupt.to_str().unwrap()),
            Err(Error::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn roll_numbers_beyond_32_bits_round_trip() {
        let (_dir, manager) = manager();
        let roll_no = 9_000_000_001_i64;

        manager.add_student("Alice", roll_no, "10A").unwrap();
        manager
            .mark_attendance(roll_no, day("2024-01-01"), Status::Present)
            .unwrap();

        assert_eq!(manager.get_student(roll_no).unwrap().roll_no, roll_no);
        assert_eq!(
            manager.attendance_for_date(day("2024-01-01")).unwrap()[0].roll_no,
            roll_no
        );
    }

    #[test]
    fn mark_remaining_absent_does_not_overwrite() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();
        manager.add_student("Bob", 102, "10A").unwrap();
        manager.add_student("Cleo", 103, "10B").unwrap();
        let date = day("2024-03-04");

        manager.mark_attendance(102, date, Status::Present).unwrap();
        assert_eq!(manager.mark_remaining_absent(date).unwrap(), 2);
        assert_eq!(manager.mark_remaining_absent(date).unwrap(), 0);

        let statuses: Vec<(i64, Status)> = manager
            .attendance_for_date(date)
            .unwrap()
            .into_iter()
            .map(|entry| (entry.roll_no, entry.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (102, Status::Present),
                (101, Status::Absent),
                (103, Status::Absent)
            ]
        );
    }

    #[test]
    fn student_attendance_splits_by_status() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();

        manager
            .mark_attendance(101, day("2024-01-03"), Status::Absent)
            .unwrap();
        manager
            .mark_attendance(101, day("2024-01-01"), Status::Present)
            .unwrap();
        manager
            .mark_attendance(101, day("2024-01-02"), Status::Present)
            .unwrap();

        let history = manager.student_attendance(101).unwrap();

        assert_eq!(history.present, vec![day("2024-01-01"), day("2024-01-02")]);
        assert_eq!(history.absent, vec![day("2024-01-03")]);
        assert!(matches!(
            manager.student_attendance(7),
            Err(Error::StudentNotFound(7))
        ));
    }

    #[test]
    fn list_dates_is_sorted() {
        let (_dir, manager) = manager();
        manager.add_student("Alice", 101, "10A").unwrap();

        for date in ["2024-02-01", "2023-12-31", "2024-01-15"] {
            manager
                .mark_attendance(101, day(date), Status::Present)
                .unwrap();
        }

        assert_eq!(
            manager.list_dates().unwrap(),
            vec![day("2023-12-31"), day("2024-01-15"), day("2024-02-01")]
        );
    }

    #[test]
    fn import_students_rejects_malformed_file_before_writing() {
        let (dir, manager) = manager();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "name,roll_no,class\nAlice,101,10A\nBob,abc,10A\n").unwrap();

        assert!(matches!(
            manager.import_students(&path),
            Err(Error::InvalidRollNo(_))
        ));
        assert_eq!(manager.num_students().unwrap(), 0);
    }

    #[test]
    fn import_students_stops_at_duplicate() {
        let (dir, manager) = manager();
        let path = dir.path().join("roster.csv");
        std::fs::write(
            &path,
            "name,roll_no,class\nAlice,101,10A\nBob,101,10A\nCleo,103,10A\n",
        )
        .unwrap();

        assert!(matches!(
            manager.import_students(&path),
            Err(Error::DuplicateRollNo(101))
        ));
        assert_eq!(
            manager.list_students().unwrap(),
            vec![RosterEntry {
                name: "Alice".to_string(),
                roll_no: 101
            }]
        );
    }
}
