// Wire shape of the application command registration API.

use super::descriptor::{
    Branch, ChoiceValue, CommandDescriptor, CommandKind, CommandOption, CommandSchema, Subcommand,
    SubcommandGroup,
};
use serde::Serialize;

const SUBCOMMAND: u8 = 1;
const SUBCOMMAND_GROUP: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationCommandPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionPayload {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoicePayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoicePayload {
    pub name: String,
    pub value: serde_json::Value,
}

impl<C> From<&CommandDescriptor<C>> for ApplicationCommandPayload {
    fn from(descriptor: &CommandDescriptor<C>) -> Self {
        let options = match (&descriptor.kind, &descriptor.schema) {
            (CommandKind::ChatInput, CommandSchema::Leaf(options)) => {
                options.iter().map(OptionPayload::from).collect()
            }
            (CommandKind::ChatInput, CommandSchema::Branches(branches)) => {
                branches.iter().map(OptionPayload::from).collect()
            }
            _ => Vec::new(),
        };

        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind.code(),
            description: descriptor.description.clone(),
            options,
            default_member_permissions: descriptor.default_member_permissions.clone(),
            dm_permission: descriptor.dm_permission,
        }
    }
}

impl From<&CommandOption> for OptionPayload {
    fn from(option: &CommandOption) -> Self {
        Self {
            kind: option.kind.code(),
            name: option.name.clone(),
            description: option.description.clone(),
            required: option.required,
            choices: option
                .choices
                .iter()
                .map(|choice| ChoicePayload {
                    name: choice.name.clone(),
                    value: match &choice.value {
                        ChoiceValue::String(value) => serde_json::Value::from(value.as_str()),
                        ChoiceValue::Integer(value) => serde_json::Value::from(*value),
                    },
                })
                .collect(),
            options: Vec::new(),
        }
    }
}

impl From<&Subcommand> for OptionPayload {
    fn from(subcommand: &Subcommand) -> Self {
        Self {
            kind: SUBCOMMAND,
            name: subcommand.name.clone(),
            description: subcommand.description.clone(),
            required: false,
            choices: Vec::new(),
            options: subcommand.options.iter().map(OptionPayload::from).collect(),
        }
    }
}

impl From<&SubcommandGroup> for OptionPayload {
    fn from(group: &SubcommandGroup) -> Self {
        Self {
            kind: SUBCOMMAND_GROUP,
            name: group.name.clone(),
            description: group.description.clone(),
            required: false,
            choices: Vec::new(),
            options: group.subcommands.iter().map(OptionPayload::from).collect(),
        }
    }
}

impl From<&Branch> for OptionPayload {
    fn from(branch: &Branch) -> Self {
        match branch {
            Branch::Group(group) => group.into(),
            Branch::Subcommand(subcommand) => subcommand.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::descriptor::{CommandHandler, CommandInvocation, OptionKind};
    use async_trait::async_trait;
    use serde_json::json;

    struct Noop;

    #[async_trait]
    impl CommandHandler<CommandInvocation> for Noop {
        async fn execute(&self, _: &CommandInvocation) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn grouped_command_serializes_to_nested_options() {
        let descriptor: CommandDescriptor<CommandInvocation> =
            CommandDescriptor::chat_input("config", "Manages this server's config", Noop)
                .branches(vec![
                    Branch::Group(SubcommandGroup::new("mod-log", "Mod log channel").subcommand(
                        Subcommand::new("set", "Set it").option(
                            CommandOption::new("channel", "The channel", OptionKind::Channel)
                                .required(),
                        ),
                    )),
                    Branch::Subcommand(Subcommand::new("view-config", "Sends the full config")),
                ])
                .admin_only()
                .guild_only();

        let value = serde_json::to_value(ApplicationCommandPayload::from(&descriptor)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "config",
                "type": 1,
                "description": "Manages this server's config",
                "default_member_permissions": "8",
                "dm_permission": false,
                "options": [
                    {
                        "type": 2,
                        "name": "mod-log",
                        "description": "Mod log channel",
                        "options": [{
                            "type": 1,
                            "name": "set",
                            "description": "Set it",
                            "options": [{
                                "type": 7,
                                "name": "channel",
                                "description": "The channel",
                                "required": true
                            }]
                        }]
                    },
                    {
                        "type": 1,
                        "name": "view-config",
                        "description": "Sends the full config"
                    }
                ]
            })
        );
    }

    #[test]
    fn context_menu_has_no_description_or_options() {
        let descriptor: CommandDescriptor<CommandInvocation> =
            CommandDescriptor::context_menu(CommandKind::User, "Avatar", Noop);

        let value = serde_json::to_value(ApplicationCommandPayload::from(&descriptor)).unwrap();
        assert_eq!(
            value,
            json!({ "name": "Avatar", "type": 2, "dm_permission": true })
        );
    }

    #[test]
    fn choices_keep_their_value_type() {
        let option = CommandOption::new("period", "Time period", OptionKind::Integer)
            .choice("Day", ChoiceValue::Integer(1))
            .choice("Week", ChoiceValue::Integer(7));

        let value = serde_json::to_value(OptionPayload::from(&option)).unwrap();
        assert_eq!(value["choices"][1], json!({ "name": "Week", "value": 7 }));
    }
}
