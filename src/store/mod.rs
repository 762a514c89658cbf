pub mod punches;
pub mod users;
