pub mod documents;
pub mod users;

pub use documents::{Document, DocumentPatch, DocumentType, DocumentsService};
pub use users::{Address, AddressPatch, NewUser, User, UserPatch, UsersService};
