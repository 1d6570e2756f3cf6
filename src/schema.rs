diesel::table! {
    attendance (attendance_id) {
        attendance_id -> Integer,
        student_id -> Integer,
        date -> Date,
        status -> Text,
    }
}

diesel::table! {
    students (student_id) {
        student_id -> Integer,
        name -> Text,
        roll_no -> BigInt,
        class -> Text,
    }
}

diesel::joinable!(attendance -> students (student_id));

diesel::allow_tables_to_appear_in_same_query!(attendance, students);
