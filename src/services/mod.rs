pub mod aggregator;
pub mod recommendation;
