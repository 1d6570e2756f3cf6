use crate::error::Error;
use crate::schema::{attendance, students};
use chrono::NaiveDate;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// A student on the roster.
#[derive(Queryable, Selectable, Tabled, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub student_id: i32,
    pub name: String,
    pub roll_no: i64,
    pub class: String,
}

#[derive(Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub roll_no: i64,
    pub class: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
}

/// Whether a student was in class on a given day. Stored as the text `Present` or `Absent`.
#[derive(AsExpression, FromSqlRow, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(Status::Present),
            "Absent" => Ok(Status::Absent),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(text.parse()?)
    }
}

/// The name and roll number of a student, as shown when picking students to mark.
#[derive(Queryable, Tabled, Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub roll_no: i64,
}

/// One attendance record joined with the student it belongs to.
#[derive(Queryable, Tabled, Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub name: String,
    pub roll_no: i64,
    pub status: Status,
}

/// A student's attendance history, split by status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StudentAttendance {
    pub present: Vec<NaiveDate>,
    pub absent: Vec<NaiveDate>,
}
