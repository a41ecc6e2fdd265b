pub mod eligibility;
pub mod scoring;
pub mod verify;

pub use eligibility::{DeadlineMode, DeadlinePolicy, SelectionValidator};
pub use scoring::{score, Score};
pub use verify::{verify, Verification};
