pub mod matching;
pub mod pathcost;
pub mod registry;
pub mod rides;
pub mod settlement;
