mod branch;
mod claims;
mod user;

pub use branch::{Branch, CreateBranch, UpdateBranch};
pub use claims::{Claims, TokenPair};
pub use user::{CreateUser, Role, UpdateUser, User, UserPublic};
