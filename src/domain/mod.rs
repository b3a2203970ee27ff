mod balance_ledger;
mod balance_update;
mod credit_card;
mod money;
mod user;

pub use balance_ledger::*;
pub use balance_update::*;
pub use credit_card::*;
pub use money::*;
pub use user::*;
