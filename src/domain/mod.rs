mod amount;
mod payment;
mod person;

pub use amount::*;
pub use payment::*;
pub use person::*;
