/// Business logic layer for blog-service
///
/// Services are built per request from `AppState`. Each operation validates
/// its input, then authorizes the caller, and only then touches the store.
pub mod comments;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use posts::PostService;
pub use users::UserService;
