pub mod ids;
pub mod logging;
pub mod serde_ext;

pub use ids::{PractitionerId, QueryId};
pub use serde_ext::clamp_f32;
