// The command model: every command module hands the registry one of these.
//
// Like the rest of `core/`, nothing in here knows about serenity. The
// interaction a handler receives is abstracted behind `InvocationContext`
// so the registry can be driven by the real Discord adapter or by a plain
// `CommandInvocation` in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the visibility option injected into every chat-input leaf.
pub const HIDE_OPTION: &str = "hide";

/// Permission bit string Discord expects for "Administrator only".
pub const ADMINISTRATOR_PERMISSION: &str = "8";

// ============================================================================
// SCHEMA
// ============================================================================

/// Which surface a command is exposed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A slash command.
    ChatInput,
    /// Right-click menu on a user.
    User,
    /// Right-click menu on a message.
    Message,
}

impl CommandKind {
    /// Numeric code used by the registration API.
    pub fn code(self) -> u8 {
        match self {
            CommandKind::ChatInput => 1,
            CommandKind::User => 2,
            CommandKind::Message => 3,
        }
    }
}

/// Value types an ordinary (non-subcommand) option can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    pub fn code(self) -> u8 {
        match self {
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

/// A plain argument of a leaf command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<OptionChoice>,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            choices: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: ChoiceValue) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value,
        });
        self
    }

    /// The cross-cutting visibility toggle. The description advertises the
    /// default the command will actually use when the user leaves it unset.
    pub fn hide(default_hide: bool) -> Self {
        Self::new(
            HIDE_OPTION,
            format!("Hide the output. Default is {}", default_hide),
            OptionKind::Boolean,
        )
    }
}

/// An executable subcommand (always a leaf).
#[derive(Debug, Clone, PartialEq)]
pub struct Subcommand {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

impl Subcommand {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

/// A named bundle of subcommands. Groups cannot contain groups.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandGroup {
    pub name: String,
    pub description: String,
    pub subcommands: Vec<Subcommand>,
}

impl SubcommandGroup {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subcommands: Vec::new(),
        }
    }

    pub fn subcommand(mut self, subcommand: Subcommand) -> Self {
        self.subcommands.push(subcommand);
        self
    }
}

/// A direct child of a command root.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    Group(SubcommandGroup),
    Subcommand(Subcommand),
}

impl Branch {
    pub fn name(&self) -> &str {
        match self {
            Branch::Group(group) => &group.name,
            Branch::Subcommand(subcommand) => &subcommand.name,
        }
    }
}

/// Shape of a command below its root.
///
/// Nesting is capped by construction: `Branches` holds groups or
/// subcommands, groups hold subcommands, and subcommands only hold plain
/// options. There is no way to express a fourth level.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandSchema {
    /// The root itself is executable.
    Leaf(Vec<CommandOption>),
    /// The root only routes to subcommands and/or subcommand groups.
    Branches(Vec<Branch>),
}

impl Default for CommandSchema {
    fn default() -> Self {
        CommandSchema::Leaf(Vec::new())
    }
}

impl CommandSchema {
    /// Option lists of every executable node, in declaration order.
    pub fn leaves(&self) -> Vec<&[CommandOption]> {
        match self {
            CommandSchema::Leaf(options) => vec![options.as_slice()],
            CommandSchema::Branches(branches) => branches
                .iter()
                .flat_map(|branch| match branch {
                    Branch::Group(group) => group
                        .subcommands
                        .iter()
                        .map(|sub| sub.options.as_slice())
                        .collect::<Vec<_>>(),
                    Branch::Subcommand(sub) => vec![sub.options.as_slice()],
                })
                .collect(),
        }
    }
}

// ============================================================================
// INVOCATION
// ============================================================================

/// A resolved option value, flattened out of whatever nesting the platform
/// delivered it in.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Boolean(bool),
    String(String),
    Integer(i64),
    Number(f64),
    User(u64),
    Channel(u64),
    Role(u64),
    Mentionable(u64),
    Attachment(u64),
}

/// What the registry needs to know about an inbound interaction.
pub trait InvocationContext: Send + Sync {
    fn command_name(&self) -> &str;

    /// Name of the selected subcommand group, if any.
    fn subcommand_group(&self) -> Option<&str>;

    /// Name of the selected subcommand, if any.
    fn subcommand(&self) -> Option<&str>;

    fn option(&self, name: &str) -> Option<&OptionValue>;

    /// Id of the user who ran the command, when the platform provides one.
    fn invoker_id(&self) -> Option<u64> {
        None
    }

    fn option_bool(&self, name: &str) -> Option<bool> {
        match self.option(name) {
            Some(OptionValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    fn option_str(&self, name: &str) -> Option<&str> {
        match self.option(name) {
            Some(OptionValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    fn option_integer(&self, name: &str) -> Option<i64> {
        match self.option(name) {
            Some(OptionValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Snowflake carried by a user/channel/role/mentionable/attachment option.
    fn option_id(&self, name: &str) -> Option<u64> {
        match self.option(name)? {
            OptionValue::User(id)
            | OptionValue::Channel(id)
            | OptionValue::Role(id)
            | OptionValue::Mentionable(id)
            | OptionValue::Attachment(id) => Some(*id),
            _ => None,
        }
    }

    /// Per-invocation visibility override, when the user set one.
    fn hide_override(&self) -> Option<bool> {
        self.option_bool(HIDE_OPTION)
    }
}

/// Platform-agnostic invocation. The Discord adapter builds one of these
/// out of each interaction; tests use it directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandInvocation {
    pub name: String,
    pub group: Option<String>,
    pub subcommand: Option<String>,
    pub options: HashMap<String, OptionValue>,
    pub invoker: Option<u64>,
}

impl CommandInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn by(mut self, user_id: u64) -> Self {
        self.invoker = Some(user_id);
        self
    }

    pub fn in_subcommand(mut self, group: Option<&str>, subcommand: &str) -> Self {
        self.group = group.map(str::to_string);
        self.subcommand = Some(subcommand.to_string());
        self
    }
}

impl InvocationContext for CommandInvocation {
    fn command_name(&self) -> &str {
        &self.name
    }

    fn subcommand_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    fn invoker_id(&self) -> Option<u64> {
        self.invoker
    }
}

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Executes a command. Errors are not swallowed by the registry; they
/// surface to whoever called `dispatch`.
#[async_trait]
pub trait CommandHandler<C>: Send + Sync {
    async fn execute(&self, ctx: &C) -> anyhow::Result<()>;
}

/// Immutable description of one command.
pub struct CommandDescriptor<C> {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    pub schema: CommandSchema,
    /// Whether output is ephemeral when the invoker doesn't say otherwise.
    pub default_hide: bool,
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
    /// Owner-only. Never installed globally and refused at dispatch for
    /// anyone who doesn't own the application.
    pub private: bool,
    pub handler: Arc<dyn CommandHandler<C>>,
}

impl<C> CommandDescriptor<C> {
    /// A slash command. Defaults to hidden output, usable in DMs, no schema.
    pub fn chat_input(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl CommandHandler<C> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CommandKind::ChatInput,
            schema: CommandSchema::default(),
            default_hide: true,
            default_member_permissions: None,
            dm_permission: true,
            private: false,
            handler: Arc::new(handler),
        }
    }

    /// A user or message context-menu command. These have no description
    /// and no options.
    pub fn context_menu(
        kind: CommandKind,
        name: impl Into<String>,
        handler: impl CommandHandler<C> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            schema: CommandSchema::default(),
            default_hide: true,
            default_member_permissions: None,
            dm_permission: true,
            private: false,
            handler: Arc::new(handler),
        }
    }

    pub fn options(mut self, options: Vec<CommandOption>) -> Self {
        self.schema = CommandSchema::Leaf(options);
        self
    }

    pub fn branches(mut self, branches: Vec<Branch>) -> Self {
        self.schema = CommandSchema::Branches(branches);
        self
    }

    pub fn default_hide(mut self, hide: bool) -> Self {
        self.default_hide = hide;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.default_member_permissions = Some(ADMINISTRATOR_PERMISSION.to_string());
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.dm_permission = false;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

impl<C> Clone for CommandDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            schema: self.schema.clone(),
            default_hide: self.default_hide,
            default_member_permissions: self.default_member_permissions.clone(),
            dm_permission: self.dm_permission,
            private: self.private,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C> fmt::Debug for CommandDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .field("default_hide", &self.default_hide)
            .field("private", &self.private)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl CommandHandler<CommandInvocation> for Noop {
        async fn execute(&self, _: &CommandInvocation) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn leaves_cover_every_executable_node() {
        let descriptor = CommandDescriptor::chat_input("config", "Config", Noop).branches(vec![
            Branch::Group(
                SubcommandGroup::new("bot-log", "Bot log")
                    .subcommand(Subcommand::new("set", "Set"))
                    .subcommand(Subcommand::new("reset", "Reset")),
            ),
            Branch::Subcommand(Subcommand::new("view-config", "View")),
        ]);

        assert_eq!(descriptor.schema.leaves().len(), 3);
    }

    #[test]
    fn flat_command_is_a_single_leaf() {
        let descriptor = CommandDescriptor::chat_input("server", "Server info", Noop);
        assert_eq!(descriptor.schema.leaves().len(), 1);
    }

    #[test]
    fn option_id_reads_any_snowflake_kind() {
        let invocation = CommandInvocation::new("config")
            .with_option("channel", OptionValue::Channel(42))
            .with_option("role", OptionValue::Role(7))
            .with_option("name", OptionValue::String("x".into()));

        assert_eq!(invocation.option_id("channel"), Some(42));
        assert_eq!(invocation.option_id("role"), Some(7));
        assert_eq!(invocation.option_id("name"), None);
        assert_eq!(invocation.option_str("name"), Some("x"));
    }

    #[test]
    fn hide_override_only_reads_booleans() {
        let explicit = CommandInvocation::new("server")
            .with_option(HIDE_OPTION, OptionValue::Boolean(false));
        assert_eq!(explicit.hide_override(), Some(false));

        let wrong_type = CommandInvocation::new("server")
            .with_option(HIDE_OPTION, OptionValue::String("no".into()));
        assert_eq!(wrong_type.hide_override(), None);
    }

    #[test]
    fn hide_option_describes_its_default() {
        assert_eq!(
            CommandOption::hide(false).description,
            "Hide the output. Default is false"
        );
    }
}
