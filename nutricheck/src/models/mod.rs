mod claim;
mod evidence;
mod report;
mod verdict;

pub use claim::*;
pub use evidence::*;
pub use report::*;
pub use verdict::*;
