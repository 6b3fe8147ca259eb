pub mod users_service;
pub mod users_shared;

pub use users_service::UsersService;
pub use users_shared::{Address, AddressPatch, NewUser, User, UserPatch};
