// Guarantees every executable node of a slash command carries exactly one
// `hide` option. Context-menu commands pass through untouched.

use super::descriptor::{
    Branch, CommandDescriptor, CommandKind, CommandOption, CommandSchema, HIDE_OPTION,
};

/// Returns a copy of `descriptor` with the hide option injected into every
/// leaf that lacks one. Presence is checked by name, so running this on an
/// already-normalized descriptor changes nothing.
///
/// `default_hide` is whatever the registry resolves for the command at the
/// time of injection; it only feeds the option's help text.
pub fn normalize<C>(descriptor: &CommandDescriptor<C>, default_hide: bool) -> CommandDescriptor<C> {
    let mut normalized = descriptor.clone();
    if normalized.kind != CommandKind::ChatInput {
        return normalized;
    }

    match &mut normalized.schema {
        CommandSchema::Leaf(options) => ensure_hide(options, default_hide),
        CommandSchema::Branches(branches) => {
            for branch in branches.iter_mut() {
                match branch {
                    Branch::Group(group) => {
                        for subcommand in group.subcommands.iter_mut() {
                            ensure_hide(&mut subcommand.options, default_hide);
                        }
                    }
                    Branch::Subcommand(subcommand) => {
                        ensure_hide(&mut subcommand.options, default_hide)
                    }
                }
            }
        }
    }

    normalized
}

fn ensure_hide(options: &mut Vec<CommandOption>, default_hide: bool) {
    if !options.iter().any(|option| option.name == HIDE_OPTION) {
        options.push(CommandOption::hide(default_hide));
    }
}
