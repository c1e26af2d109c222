// The in-memory source of truth for which commands exist.
//
// Readers never lock: the whole command set lives behind an `ArcSwap` and
// is replaced in one store. A reader either sees the set from before a
// reload or the one after it, never a mix of both.

use super::descriptor::{CommandDescriptor, InvocationContext};
use super::loader::{load, CommandCatalog, LoadError};
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An immutable, fully loaded set of commands.
pub struct CommandSet<C> {
    commands: HashMap<String, Arc<CommandDescriptor<C>>>,
}

impl<C> CommandSet<C> {
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CommandDescriptor<C>>> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Descriptors sorted by name, so payloads are stable between runs.
    pub fn descriptors(&self) -> Vec<&CommandDescriptor<C>> {
        let mut descriptors: Vec<&CommandDescriptor<C>> =
            self.commands.values().map(|descriptor| &**descriptor).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl<C> From<HashMap<String, CommandDescriptor<C>>> for CommandSet<C> {
    fn from(commands: HashMap<String, CommandDescriptor<C>>) -> Self {
        Self {
            commands: commands
                .into_iter()
                .map(|(name, descriptor)| (name, Arc::new(descriptor)))
                .collect(),
        }
    }
}

/// What `resolve_visibility` is asked about.
pub enum VisibilityQuery<'q> {
    Name(&'q str),
    Invocation(&'q dyn InvocationContext),
}

impl<'q> From<&'q str> for VisibilityQuery<'q> {
    fn from(name: &'q str) -> Self {
        VisibilityQuery::Name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No command by that name. The platform and the registry disagree,
    /// which is not something dispatch can fix.
    Missed,
    /// A private command run by someone who doesn't own the application.
    Forbidden,
}

pub struct CommandRegistry<C> {
    current: ArcSwap<CommandSet<C>>,
    owners: ArcSwap<HashSet<u64>>,
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(CommandSet::empty()),
            owners: ArcSwap::from_pointee(HashSet::new()),
        }
    }

    /// Users allowed to run private commands. Until this is called nobody is.
    pub fn set_owners(&self, owners: impl IntoIterator<Item = u64>) {
        self.owners.store(Arc::new(owners.into_iter().collect()));
    }

    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owners.load().contains(&user_id)
    }

    /// Replaces the entire command set in one atomic store.
    pub fn register(&self, commands: HashMap<String, CommandDescriptor<C>>) {
        self.current.store(Arc::new(CommandSet::from(commands)));
    }

    /// Loads the catalog and swaps it in. A load error leaves the current
    /// set untouched.
    pub fn initialize(&self, catalog: &CommandCatalog<C>) -> Result<usize, LoadError> {
        let commands = load(catalog)?;
        let count = commands.len();
        self.register(commands);
        tracing::info!(commands = count, "Command registry initialized");
        Ok(count)
    }

    pub fn reload(&self, catalog: &CommandCatalog<C>) -> Result<usize, LoadError> {
        let commands = load(catalog)?;
        let count = commands.len();
        self.register(commands);
        tracing::info!(commands = count, "Command registry reloaded");
        Ok(count)
    }

    /// The current set. Holding the returned `Arc` does not block reloads.
    pub fn snapshot(&self) -> Arc<CommandSet<C>> {
        self.current.load_full()
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDescriptor<C>>> {
        self.current.load().get(name).cloned()
    }

    /// Whether a command's output should be ephemeral.
    ///
    /// An explicit per-invocation override wins, then the command's own
    /// default. Unknown commands resolve to hidden.
    pub fn resolve_visibility<'q>(&self, query: impl Into<VisibilityQuery<'q>>) -> bool {
        match query.into() {
            VisibilityQuery::Name(name) => self.default_hide(name),
            VisibilityQuery::Invocation(ctx) => ctx
                .hide_override()
                .unwrap_or_else(|| self.default_hide(ctx.command_name())),
        }
    }

    fn default_hide(&self, name: &str) -> bool {
        self.current
            .load()
            .get(name)
            .map(|descriptor| descriptor.default_hide)
            .unwrap_or(true)
    }
}

impl<C: InvocationContext> CommandRegistry<C> {
    /// Runs the handler registered under the context's command name.
    ///
    /// Handler errors are returned as-is. Unknown names are a normal
    /// outcome and never an error, and neither is a private command run by
    /// a non-owner: the handler is simply not called.
    pub async fn dispatch(&self, ctx: &C) -> anyhow::Result<DispatchOutcome> {
        let Some(descriptor) = self.resolve(ctx.command_name()) else {
            tracing::info!(
                command = ctx.command_name(),
                "Ignoring interaction for unregistered command"
            );
            return Ok(DispatchOutcome::Missed);
        };

        if descriptor.private && !ctx.invoker_id().is_some_and(|id| self.is_owner(id)) {
            tracing::warn!(
                command = ctx.command_name(),
                invoker = ?ctx.invoker_id(),
                "Refused private command for non-owner"
            );
            return Ok(DispatchOutcome::Forbidden);
        }

        descriptor.handler.execute(ctx).await?;
        Ok(DispatchOutcome::Handled)
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::descriptor::{
        CommandHandler, CommandInvocation, OptionValue, HIDE_OPTION,
    };
    use crate::core::commands::loader::CommandModule;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl CommandHandler<CommandInvocation> for Counting {
        async fn execute(&self, _: &CommandInvocation) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler<CommandInvocation> for Failing {
        async fn execute(&self, _: &CommandInvocation) -> anyhow::Result<()> {
            anyhow::bail!("handler exploded")
        }
    }

    type Descriptor = CommandDescriptor<CommandInvocation>;

    fn command(name: &str, hide: bool, calls: &Arc<AtomicUsize>) -> (String, Descriptor) {
        let descriptor = CommandDescriptor::chat_input(name, "Test command", Counting(calls.clone()))
            .default_hide(hide);
        (name.to_string(), descriptor)
    }

    fn registry_with(entries: Vec<(String, Descriptor)>) -> CommandRegistry<CommandInvocation> {
        let registry = CommandRegistry::new();
        registry.register(entries.into_iter().collect());
        registry
    }

    #[tokio::test]
    async fn dispatch_invokes_the_matching_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![command("server", false, &calls)]);

        let outcome = registry
            .dispatch(&CommandInvocation::new("server"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_dispatch_is_silent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![command("server", false, &calls)]);

        let outcome = registry
            .dispatch(&CommandInvocation::new("nonexistent"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Missed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let registry = CommandRegistry::new();
        let mut commands = HashMap::new();
        commands.insert(
            "boom".to_string(),
            CommandDescriptor::chat_input("boom", "Always fails", Failing),
        );
        registry.register(commands);

        let err = registry
            .dispatch(&CommandInvocation::new("boom"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exploded"));
    }

    #[tokio::test]
    async fn private_commands_only_run_for_owners() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (name, descriptor) = command("build", true, &calls);
        let registry = registry_with(vec![(name, descriptor.private())]);

        // No owners configured yet: refused even with an invoker.
        let outcome = registry
            .dispatch(&CommandInvocation::new("build").by(42))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Forbidden);

        registry.set_owners([42]);
        let stranger = registry
            .dispatch(&CommandInvocation::new("build").by(7))
            .await
            .unwrap();
        let anonymous = registry
            .dispatch(&CommandInvocation::new("build"))
            .await
            .unwrap();
        assert_eq!(stranger, DispatchOutcome::Forbidden);
        assert_eq!(anonymous, DispatchOutcome::Forbidden);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let owner = registry
            .dispatch(&CommandInvocation::new("build").by(42))
            .await
            .unwrap();
        assert_eq!(owner, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn public_commands_ignore_ownership() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![command("server", false, &calls)]);

        let outcome = registry
            .dispatch(&CommandInvocation::new("server").by(7))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled);
    }

    #[test]
    fn visibility_falls_back_to_default_hide() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![
            command("secret", true, &calls),
            command("public", false, &calls),
        ]);

        assert!(registry.resolve_visibility("secret"));
        assert!(!registry.resolve_visibility("public"));

        let invocation = CommandInvocation::new("secret");
        assert!(registry.resolve_visibility(VisibilityQuery::Invocation(&invocation)));
    }

    #[test]
    fn explicit_override_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![
            command("secret", true, &calls),
            command("public", false, &calls),
        ]);

        let shown = CommandInvocation::new("secret")
            .with_option(HIDE_OPTION, OptionValue::Boolean(false));
        assert!(!registry.resolve_visibility(VisibilityQuery::Invocation(&shown)));

        let hidden = CommandInvocation::new("public")
            .with_option(HIDE_OPTION, OptionValue::Boolean(true));
        assert!(registry.resolve_visibility(VisibilityQuery::Invocation(&hidden)));
    }

    #[test]
    fn unknown_names_default_to_hidden() {
        let registry = CommandRegistry::<CommandInvocation>::new();
        assert!(registry.resolve_visibility("missing"));
        assert!(registry.resolve_visibility(VisibilityQuery::Invocation(
            &CommandInvocation::new("missing")
        )));
    }

    #[test]
    fn register_replaces_wholesale() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![command("a", true, &calls), command("b", true, &calls)]);
        registry.register(vec![command("c", true, &calls)].into_iter().collect());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.names(), vec!["c"]);
        assert!(registry.resolve("a").is_none());
    }

    #[test]
    fn snapshot_outlives_a_swap() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(vec![command("old", true, &calls)]);

        let before = registry.snapshot();
        registry.register(vec![command("new", true, &calls)].into_iter().collect());

        assert_eq!(before.names(), vec!["old"]);
        assert_eq!(registry.snapshot().names(), vec!["new"]);
    }

    #[test]
    fn failed_reload_keeps_current_set() {
        fn broken() -> Descriptor {
            CommandDescriptor::chat_input("Broken Name", "bad", Failing)
        }
        fn fine() -> Descriptor {
            CommandDescriptor::chat_input("fine", "good", Failing)
        }

        let registry = CommandRegistry::new();
        let good = CommandCatalog::new().category(
            "util",
            vec![CommandModule {
                path: "util/fine",
                build: fine,
            }],
        );
        assert_eq!(registry.initialize(&good).unwrap(), 1);

        let bad = CommandCatalog::new().category(
            "util",
            vec![CommandModule {
                path: "util/broken",
                build: broken,
            }],
        );
        assert!(registry.reload(&bad).is_err());
        assert_eq!(registry.snapshot().names(), vec!["fine"]);
    }

    #[test]
    fn concurrent_readers_see_whole_sets() {
        let calls = Arc::new(AtomicUsize::new(0));
        let old_names = ["a1", "a2", "a3", "a4"];
        let new_names = ["b1", "b2", "b3"];

        let build = |names: &[&str]| -> HashMap<String, Descriptor> {
            names
                .iter()
                .map(|name| command(name, true, &calls))
                .collect()
        };

        let registry = Arc::new(registry_with(build(&old_names).into_iter().collect()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = registry.snapshot();
                        let names = snapshot.names();
                        let all_old = names == old_names.to_vec();
                        let all_new = names == new_names.to_vec();
                        assert!(all_old || all_new, "mixed snapshot: {:?}", names);
                    }
                })
            })
            .collect();

        for i in 0..200 {
            let names: &[&str] = if i % 2 == 0 { &new_names } else { &old_names };
            registry.register(build(names));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
