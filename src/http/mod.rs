pub mod content;
pub mod handler;
pub mod method;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod status;

pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::Server;

/// Size of the single read performed per connection. A request larger than
/// this is truncated; the original daemon read exactly once into a 4096-byte
/// buffer and that capacity limit is kept.
pub const BUFFER_SIZE: usize = 4096;
