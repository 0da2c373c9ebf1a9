/*!
Subcommand modules.

  src/cmd/
    mod.rs       (this file: declarations + re-exports)
    ask.rs       (AskArgs     + execute_ask)
    chat.rs      (ChatArgs    + execute_chat)
    aliases.rs   (AliasesArgs + execute_aliases)
    shared.rs    (GlobalOpts, Session, rendering and error helpers)
    format.rs    (color / box / table helpers for human output)

Conventions:
  - Each subcommand exposes one `execute_*` returning `anyhow::Result<()>`.
  - Argument structs derive `clap::Args`.
  - JSON output never goes through `format`.
*/

pub mod aliases;
pub mod ask;
pub mod chat;
pub mod format;
pub mod shared;

pub use aliases::{AliasesArgs, execute_aliases};
pub use ask::{AskArgs, execute_ask};
pub use chat::{ChatArgs, execute_chat};
pub use shared::GlobalOpts;
