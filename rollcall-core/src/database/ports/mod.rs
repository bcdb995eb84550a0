pub mod logs;
pub mod roster;
pub mod students;
pub mod users;

pub use logs::DismissalLogRepository;
pub use roster::RosterRepository;
pub use students::StudentRepository;
pub use users::UserRepository;
