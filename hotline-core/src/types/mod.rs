pub mod action;
pub mod call;
pub mod handle;
pub mod provider;

pub use action::{ActionOutcome, CallAction};
pub use call::{CallDirection, CallId, CallUpdate};
pub use handle::{Handle, HandleType};
pub use provider::ProviderError;
