mod handle_break;
mod handle_repair;
mod handle_verify;

pub use handle_break::handle_break_command;
pub use handle_repair::handle_repair_command;
pub use handle_verify::handle_verify_command;
