mod listing;

pub use listing::{list_candidates, order_by_creation, Candidate};
