//! External collaborators
//!
//! Each service is a trait seam with an HTTP implementation and, where it
//! makes sense, a local stand-in. All implementations are blocking and are
//! held as `Arc<dyn Trait>` by the API state.

pub mod imagery;
pub mod parcel_store;
pub mod auth;
pub mod renderer;

pub use imagery::{HttpNdviProvider, ImageryError, NdviProvider, NdviQuery, TileStyle, UnavailableProvider};
pub use parcel_store::{InMemoryParcelStore, ParcelInsight, ParcelRecord, ParcelStore, RestParcelStore, StoreError};
pub use auth::{AuthError, AuthProvider, AuthSession, AuthUser, Credentials, DisabledAuth, GoTrueAuth};
pub use renderer::{HttpPdfRenderer, PdfRenderer, RenderError};
