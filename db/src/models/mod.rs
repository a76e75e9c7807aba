pub mod attendance_record;
pub mod attendance_total;
pub mod processed_session;
pub mod session;
pub mod session_course;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_total::Entity as AttendanceTotal;
pub use processed_session::Entity as ProcessedSession;
pub use session::Entity as Session;
pub use session_course::Entity as SessionCourse;
