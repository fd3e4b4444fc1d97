//! Order checkout: number reservation, re-pricing, commit and the auth
//! checkpoint.
//!
//! The draft never touches the orders tables until [`OrderCommitter::commit`].
//! Before that it lives in request and response bodies, and in the session
//! only while the customer passes through login.

mod checkpoint;
mod commit;
mod number;
mod pricing;

pub use checkpoint::{Checkpoint, park_draft, resume};
pub use commit::{CommitError, CommitOutcome, OrderCommitter};
pub use number::{MAX_ATTEMPTS, generate_order_number};
pub use pricing::{Pricer, PricingError};
