//! Admin-CLI layer: building invocations of the server's command-line tool,
//! executing them, and decoding the tool's tabular output.

mod command;
mod keys;
mod table;

pub use command::{AdminTool, CommandOptions, CommandOutput, CommandSpec, OptionKey};
pub use keys::SigningKeys;
pub use table::{encode_table, parse_table, Record};
