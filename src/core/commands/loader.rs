// Turns the command manifest into a name-keyed map of validated descriptors.
//
// Commands are discovered through an explicit manifest rather than by
// scanning files: each category lists constructor functions, and adding a
// command means adding one line to its category.

use super::descriptor::{
    Branch, CommandDescriptor, CommandKind, CommandOption, CommandSchema, OptionKind, HIDE_OPTION,
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

const MAX_NAME_LEN: usize = 32;
const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_OPTIONS: usize = 25;

pub type CommandConstructor<C> = fn() -> CommandDescriptor<C>;

/// One command module: where it lives and how to build it.
pub struct CommandModule<C> {
    pub path: &'static str,
    pub build: CommandConstructor<C>,
}

pub struct CommandCategory<C> {
    pub name: &'static str,
    pub modules: Vec<CommandModule<C>>,
}

/// The two-level command namespace: category -> command module.
pub struct CommandCatalog<C> {
    categories: Vec<CommandCategory<C>>,
}

impl<C> CommandCatalog<C> {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    pub fn category(mut self, name: &'static str, modules: Vec<CommandModule<C>>) -> Self {
        self.categories.push(CommandCategory { name, modules });
        self
    }

    pub fn categories(&self) -> &[CommandCategory<C>] {
        &self.categories
    }
}

impl<C> Default for CommandCatalog<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("category `{0}` contains no command modules")]
    EmptyCategory(String),

    #[error("{module}: invalid name `{name}`")]
    InvalidName { module: String, name: String },

    #[error("{module}: description of `{name}` must be 1-100 characters")]
    InvalidDescription { module: String, name: String },

    #[error("{module}: `{parent}` declares `{name}` more than once")]
    DuplicateOption {
        module: String,
        parent: String,
        name: String,
    },

    #[error("{module}: `{parent}` declares {count} options, the limit is 25")]
    TooManyOptions {
        module: String,
        parent: String,
        count: usize,
    },

    #[error("{module}: required option `{name}` follows an optional one")]
    RequiredAfterOptional { module: String, name: String },

    #[error("{module}: `{name}` has no subcommands")]
    EmptyBranch { module: String, name: String },

    #[error("{module}: `{name}` is reserved for a boolean option")]
    ReservedOption { module: String, name: String },

    #[error("{module}: context menu command `{name}` cannot declare options")]
    ContextMenuOptions { module: String, name: String },
}

/// Builds and validates every module in the catalog.
///
/// Any non-conforming module fails the whole load; a partially populated
/// command set is never returned. The registry key is the name the
/// descriptor declares, not the category or module path.
pub fn load<C>(
    catalog: &CommandCatalog<C>,
) -> Result<HashMap<String, CommandDescriptor<C>>, LoadError> {
    let mut commands = HashMap::new();

    for category in catalog.categories() {
        if category.modules.is_empty() {
            return Err(LoadError::EmptyCategory(category.name.to_string()));
        }

        for module in &category.modules {
            let descriptor = (module.build)();
            validate(module.path, &descriptor)?;

            tracing::debug!(
                category = category.name,
                module = module.path,
                command = %descriptor.name,
                "Loaded command"
            );

            if let Some(previous) = commands.insert(descriptor.name.clone(), descriptor) {
                tracing::warn!(
                    command = %previous.name,
                    module = module.path,
                    "Command declared twice; the later module wins"
                );
            }
        }
    }

    Ok(commands)
}

fn validate<C>(module: &str, descriptor: &CommandDescriptor<C>) -> Result<(), LoadError> {
    let name = descriptor.name.as_str();

    if descriptor.kind != CommandKind::ChatInput {
        if !is_valid_menu_name(name) {
            return Err(LoadError::InvalidName {
                module: module.to_string(),
                name: name.to_string(),
            });
        }
        return match &descriptor.schema {
            CommandSchema::Leaf(options) if options.is_empty() => Ok(()),
            _ => Err(LoadError::ContextMenuOptions {
                module: module.to_string(),
                name: name.to_string(),
            }),
        };
    }

    check_node(module, name, &descriptor.description)?;

    match &descriptor.schema {
        CommandSchema::Leaf(options) => check_leaf(module, name, options),
        CommandSchema::Branches(branches) => {
            if branches.is_empty() {
                return Err(LoadError::EmptyBranch {
                    module: module.to_string(),
                    name: name.to_string(),
                });
            }
            check_siblings(module, name, branches.iter().map(Branch::name))?;
            check_count(module, name, branches.len())?;

            for branch in branches {
                match branch {
                    Branch::Subcommand(sub) => {
                        check_node(module, &sub.name, &sub.description)?;
                        check_leaf(module, &sub.name, &sub.options)?;
                    }
                    Branch::Group(group) => {
                        check_node(module, &group.name, &group.description)?;
                        if group.subcommands.is_empty() {
                            return Err(LoadError::EmptyBranch {
                                module: module.to_string(),
                                name: group.name.clone(),
                            });
                        }
                        check_siblings(
                            module,
                            &group.name,
                            group.subcommands.iter().map(|sub| sub.name.as_str()),
                        )?;
                        check_count(module, &group.name, group.subcommands.len())?;

                        for sub in &group.subcommands {
                            check_node(module, &sub.name, &sub.description)?;
                            check_leaf(module, &sub.name, &sub.options)?;
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn check_leaf(module: &str, parent: &str, options: &[CommandOption]) -> Result<(), LoadError> {
    check_siblings(module, parent, options.iter().map(|o| o.name.as_str()))?;

    // Leave room for the hide option the normalizer will add.
    let has_hide = options.iter().any(|o| o.name == HIDE_OPTION);
    let count = options.len() + usize::from(!has_hide);
    check_count(module, parent, count)?;

    let mut seen_optional = false;
    for option in options {
        check_node(module, &option.name, &option.description)?;

        if option.name == HIDE_OPTION && option.kind != OptionKind::Boolean {
            return Err(LoadError::ReservedOption {
                module: module.to_string(),
                name: option.name.clone(),
            });
        }

        if option.required && seen_optional {
            return Err(LoadError::RequiredAfterOptional {
                module: module.to_string(),
                name: option.name.clone(),
            });
        }
        seen_optional |= !option.required;
    }

    Ok(())
}

fn check_node(module: &str, name: &str, description: &str) -> Result<(), LoadError> {
    if !is_valid_name(name) {
        return Err(LoadError::InvalidName {
            module: module.to_string(),
            name: name.to_string(),
        });
    }

    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(LoadError::InvalidDescription {
            module: module.to_string(),
            name: name.to_string(),
        });
    }

    Ok(())
}

fn check_siblings<'a>(
    module: &str,
    parent: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(LoadError::DuplicateOption {
                module: module.to_string(),
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_count(module: &str, parent: &str, count: usize) -> Result<(), LoadError> {
    if count > MAX_OPTIONS {
        return Err(LoadError::TooManyOptions {
            module: module.to_string(),
            parent: parent.to_string(),
            count,
        });
    }
    Ok(())
}

/// Slash command and option names: 1-32 chars of lowercase `[a-z0-9_-]`.
fn is_valid_name(name: &str) -> bool {
    (1..=MAX_NAME_LEN).contains(&name.chars().count())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Context menu names are free text, just length-limited.
fn is_valid_menu_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && name.chars().count() <= MAX_NAME_LEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::descriptor::{
        CommandHandler, CommandInvocation, Subcommand, SubcommandGroup,
    };
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler<CommandInvocation> for Noop {
        async fn execute(&self, _: &CommandInvocation) -> anyhow::Result<()> {
            Ok(())
        }
    }

    type Descriptor = CommandDescriptor<CommandInvocation>;

    fn server() -> Descriptor {
        CommandDescriptor::chat_input("server", "Sends information about this server", Noop)
    }

    fn build() -> Descriptor {
        CommandDescriptor::chat_input("build", "Build commands", Noop).branches(vec![
            Branch::Subcommand(Subcommand::new("global", "Build global commands")),
            Branch::Subcommand(Subcommand::new("guild", "Build guild commands")),
        ])
    }

    fn avatar() -> Descriptor {
        CommandDescriptor::context_menu(CommandKind::User, "Avatar", Noop)
    }

    fn shadow_server() -> Descriptor {
        CommandDescriptor::chat_input("server", "A second server command", Noop)
    }

    fn bad_name() -> Descriptor {
        CommandDescriptor::chat_input("Server Info", "Has spaces", Noop)
    }

    fn missing_description() -> Descriptor {
        CommandDescriptor::chat_input("empty", "", Noop)
    }

    fn duplicate_option() -> Descriptor {
        CommandDescriptor::chat_input("dup", "Duplicates", Noop).options(vec![
            CommandOption::new("user", "A user", OptionKind::User),
            CommandOption::new("user", "Same user", OptionKind::User),
        ])
    }

    fn required_after_optional() -> Descriptor {
        CommandDescriptor::chat_input("order", "Bad ordering", Noop).options(vec![
            CommandOption::new("first", "Optional", OptionKind::String),
            CommandOption::new("second", "Required", OptionKind::String).required(),
        ])
    }

    fn empty_group() -> Descriptor {
        CommandDescriptor::chat_input("config", "Config", Noop).branches(vec![Branch::Group(
            SubcommandGroup::new("bot-log", "Bot log"),
        )])
    }

    fn string_hide() -> Descriptor {
        CommandDescriptor::chat_input("sneaky", "Wrong hide type", Noop).options(vec![
            CommandOption::new(HIDE_OPTION, "Not a boolean", OptionKind::String),
        ])
    }

    fn crowded() -> Descriptor {
        let options = (0..25)
            .map(|i| CommandOption::new(format!("opt{}", i), "Filler", OptionKind::String))
            .collect();
        CommandDescriptor::chat_input("crowded", "No room for hide", Noop).options(options)
    }

    fn menu_with_options() -> Descriptor {
        CommandDescriptor::context_menu(CommandKind::Message, "Quote", Noop)
            .options(vec![CommandOption::new("x", "x", OptionKind::String)])
    }

    fn module(
        path: &'static str,
        build: CommandConstructor<CommandInvocation>,
    ) -> CommandModule<CommandInvocation> {
        CommandModule { path, build }
    }

    fn single(build: CommandConstructor<CommandInvocation>) -> CommandCatalog<CommandInvocation> {
        CommandCatalog::new().category("test", vec![module("test/cmd", build)])
    }

    #[test]
    fn keys_come_from_declared_names_not_categories() {
        let catalog = CommandCatalog::new()
            .category(
                "info",
                vec![module("info/server", server), module("info/avatar", avatar)],
            )
            .category("util", vec![module("util/build", build)]);

        let commands = load(&catalog).unwrap();
        let mut names: Vec<_> = commands.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["Avatar", "build", "server"]);
    }

    #[test]
    fn later_module_overwrites_same_name() {
        let catalog = CommandCatalog::new()
            .category("info", vec![module("info/server", server)])
            .category("extra", vec![module("extra/server", shadow_server)]);

        let commands = load(&catalog).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands["server"].description, "A second server command");
    }

    #[test]
    fn one_bad_module_fails_the_whole_load() {
        let catalog = CommandCatalog::new()
            .category("info", vec![module("info/server", server)])
            .category("broken", vec![module("broken/bad", bad_name)]);

        assert_eq!(
            load(&catalog).unwrap_err(),
            LoadError::InvalidName {
                module: "broken/bad".into(),
                name: "Server Info".into(),
            }
        );
    }

    #[test]
    fn empty_category_is_rejected() {
        let catalog = CommandCatalog::<CommandInvocation>::new().category("ghost", vec![]);
        assert_eq!(
            load(&catalog).unwrap_err(),
            LoadError::EmptyCategory("ghost".into())
        );
    }

    #[test]
    fn malformed_schemas_are_rejected() {
        assert!(matches!(
            load(&single(missing_description)),
            Err(LoadError::InvalidDescription { .. })
        ));
        assert!(matches!(
            load(&single(duplicate_option)),
            Err(LoadError::DuplicateOption { .. })
        ));
        assert!(matches!(
            load(&single(required_after_optional)),
            Err(LoadError::RequiredAfterOptional { .. })
        ));
        assert!(matches!(
            load(&single(empty_group)),
            Err(LoadError::EmptyBranch { .. })
        ));
        assert!(matches!(
            load(&single(string_hide)),
            Err(LoadError::ReservedOption { .. })
        ));
        assert!(matches!(
            load(&single(crowded)),
            Err(LoadError::TooManyOptions { count: 26, .. })
        ));
        assert!(matches!(
            load(&single(menu_with_options)),
            Err(LoadError::ContextMenuOptions { .. })
        ));
    }

    #[test]
    fn name_rules() {
        assert!(is_valid_name("view-config"));
        assert!(is_valid_name("bot_log2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Upper"));
        assert!(!is_valid_name(&"a".repeat(33)));
        assert!(is_valid_menu_name("User Info"));
        assert!(!is_valid_menu_name("   "));
    }
}
