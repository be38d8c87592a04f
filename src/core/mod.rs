pub mod api;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod session;
pub mod version;

pub use api::{api_get, api_props};
pub use error::{ExtractError, Result};
pub use extractor::{can_extract, UrlKind};
pub use metadata::{Extraction, ManifestDescriptor, ManifestHeaders, MediaRecord, PlaylistRecord};
pub use session::{HttpResponse, ReqwestTransport, Session, Transport};
pub use version::resolve_version;
