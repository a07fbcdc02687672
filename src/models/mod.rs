pub mod enums;
pub mod lab;
pub mod recommendation;
pub mod reference;
pub mod report;

pub use enums::*;
pub use lab::*;
pub use recommendation::*;
pub use reference::*;
pub use report::*;
