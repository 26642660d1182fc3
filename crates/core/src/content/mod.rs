//! Free-form content: user-submitted posts (text, images, links, video, QR
//! codes, iframes) grouped into scope-limited content streams.

mod caption;
mod post;
mod stream;

pub use caption::Caption;
pub use post::{ContentBody, FreeFormContent};
pub use stream::{ContentStream, GroupedStreams, PermissionLevel, StreamScope};
