pub use super::roles::Entity as Roles;
pub use super::statuses::Entity as Statuses;
pub use super::user_types::Entity as UserTypes;
pub use super::users::Entity as Users;
