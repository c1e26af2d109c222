// Discord command modules, grouped the same way the manifest groups them.
// Adding a command means adding its module here and one line to `catalog`.

#[path = "config/config.rs"]
pub mod config;
#[path = "info/avatar.rs"]
pub mod avatar;
#[path = "info/server.rs"]
pub mod server;
#[path = "util/build.rs"]
pub mod build;

use crate::core::commands::{CommandCatalog, CommandModule};
use crate::discord::SlashContext;

pub fn catalog() -> CommandCatalog<SlashContext> {
    CommandCatalog::new()
        .category(
            "info",
            vec![
                CommandModule {
                    path: "info/server",
                    build: server::command,
                },
                CommandModule {
                    path: "info/avatar",
                    build: avatar::command,
                },
            ],
        )
        .category(
            "config",
            vec![CommandModule {
                path: "config/config",
                build: config::command,
            }],
        )
        .category(
            "util",
            vec![CommandModule {
                path: "util/build",
                build: build::command,
            }],
        )
}
