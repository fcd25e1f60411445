mod database;
mod history_repo;
mod recipient_repo;
mod retry;
mod schedule_repo;

pub use database::Database;
pub use history_repo::HistoryRepository;
pub use recipient_repo::RecipientRepository;
pub use schedule_repo::ScheduleRepository;
