pub mod prelude;

pub mod roles;
pub mod statuses;
pub mod user_types;
pub mod users;
