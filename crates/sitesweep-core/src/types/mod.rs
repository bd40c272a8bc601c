mod decommission;
mod dns;
mod report;
mod secret;
mod site;

pub use decommission::*;
pub use dns::*;
pub use report::*;
pub use secret::*;
pub use site::*;
