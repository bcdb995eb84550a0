pub mod repositories;

pub use repositories::{
    PostgresDismissalLogRepository, PostgresRosterRepository, PostgresStudentRepository,
    PostgresUserRepository,
};
