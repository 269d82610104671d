pub mod proposal;
pub mod reconcile;
pub mod worker;
