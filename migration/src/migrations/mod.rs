pub mod m202608150001_create_sessions;
pub mod m202608150002_create_attendance;
