pub mod aig;
pub mod cnf;
pub mod fec;
pub mod fraig;
pub mod optimize;
pub mod sat;
pub mod sim;
pub mod strash;

// Re-exporting symbols and modules.
pub use aig::dfs;
pub use aig::{Aig, AigEdge, AigError, AigNode, FaninId, NodeId, NodeKind, ParserError, Result};
