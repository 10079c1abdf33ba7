mod discard;
mod exec;
mod multi;

pub use discard::{discard, DiscardArguments};
pub use exec::{exec, run_transaction_commands, ExecArguments};
pub use multi::{multi, MultiArguments};
