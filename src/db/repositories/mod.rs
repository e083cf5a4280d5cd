pub mod lookup;
pub mod user;
