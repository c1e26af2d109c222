pub mod descriptor;
pub mod loader;
pub mod normalizer;
pub mod payload;
pub mod registry;
pub mod sync;

pub use descriptor::{
    Branch, CommandDescriptor, CommandHandler, CommandKind, CommandOption, InvocationContext,
    OptionKind, OptionValue, Subcommand, SubcommandGroup, HIDE_OPTION,
};
pub use loader::{CommandCatalog, CommandModule, LoadError};
pub use registry::{CommandRegistry, DispatchOutcome, VisibilityQuery};
pub use sync::{
    is_snowflake, CommandRegistrationApi, CommandRoute, CommandSynchronizer, RegistrationError,
    SyncConfig, SyncMode, SyncScope,
};
