mod logs;
mod roster;
mod students;
mod users;

pub use logs::PostgresDismissalLogRepository;
pub use roster::PostgresRosterRepository;
pub use students::PostgresStudentRepository;
pub use users::PostgresUserRepository;
