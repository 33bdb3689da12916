mod inventory;
mod issues;
mod pending;

pub use inventory::cmd_inventory;
pub use issues::cmd_issues;
pub use pending::cmd_pending;
