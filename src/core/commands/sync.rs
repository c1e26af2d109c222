// Pushes the local command set to the remote registration endpoint.
//
// Every sync is a single full-replace PUT for one scope. There is no diffing
// and no automatic retry: syncs are rare, operator-triggered and idempotent,
// so a failure is reported and the operator runs it again.

use super::normalizer::normalize;
use super::payload::ApplicationCommandPayload;
use super::registry::{CommandRegistry, CommandSet};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// REQUEST MODEL
// ============================================================================

/// Where commands are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    Global,
    /// A single guild, identified by its raw (unvalidated) id.
    Guild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Install,
    Clear,
}

/// A validated registration target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRoute {
    Application {
        application_id: String,
    },
    Guild {
        application_id: String,
        guild_id: String,
    },
}

impl CommandRoute {
    /// Path below the API root, e.g. `/applications/1/guilds/2/commands`.
    pub fn path(&self) -> String {
        match self {
            CommandRoute::Application { application_id } => {
                format!("/applications/{}/commands", application_id)
            }
            CommandRoute::Guild {
                application_id,
                guild_id,
            } => format!(
                "/applications/{}/guilds/{}/commands",
                application_id, guild_id
            ),
        }
    }
}

/// Everything one sync call sends. Built fresh per call.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub scope: SyncScope,
    pub mode: SyncMode,
    pub route: CommandRoute,
    pub payload: Vec<ApplicationCommandPayload>,
}

/// What a successful sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub scope: SyncScope,
    pub mode: SyncMode,
    /// Commands the remote acknowledged after the replace.
    pub count: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.scope {
            SyncScope::Global => "globally".to_string(),
            SyncScope::Guild(id) => format!("in guild {}", id),
        };
        match self.mode {
            SyncMode::Install => {
                let noun = if self.count == 1 { "command" } else { "commands" };
                write!(f, "Set {} {} {}", self.count, noun, target)
            }
            SyncMode::Clear => write!(f, "Cleared commands {}", target),
        }
    }
}

/// Static inputs of the synchronizer. The credential is injected here
/// rather than read from the environment at call time.
#[derive(Clone)]
pub struct SyncConfig {
    pub token: Option<String>,
    pub application_id: String,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("application_id", &self.application_id)
            .finish()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by a registration backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The credential could not be put on the wire at all.
    #[error("unusable credential: {0}")]
    Credential(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Missing or unusable credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed application or guild id. Nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not reach Discord: {0}")]
    Transport(String),

    #[error("Discord rejected the commands ({status}): {message}")]
    RemoteRejection { status: u16, message: String },
}

impl From<RegistrationError> for SyncError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Transport(message) => SyncError::Transport(message),
            RegistrationError::Rejected { status, message } => {
                SyncError::RemoteRejection { status, message }
            }
            RegistrationError::Credential(message) => SyncError::Config(message),
        }
    }
}

// ============================================================================
// PORT
// ============================================================================

/// The remote command registration endpoint.
#[async_trait]
pub trait CommandRegistrationApi: Send + Sync {
    /// Replaces every command under `route` with `payload`. Returns how many
    /// commands the remote reports afterwards.
    async fn put_commands(
        &self,
        route: &CommandRoute,
        token: &str,
        payload: &[ApplicationCommandPayload],
    ) -> Result<usize, RegistrationError>;
}

// ============================================================================
// SERVICE
// ============================================================================

/// Tokens travel in an HTTP header, so only visible ASCII is allowed.
pub fn is_header_safe_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_graphic())
}

/// Discord snowflakes are 17-20 ASCII digits.
pub fn is_snowflake(id: &str) -> bool {
    (17..=20).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit())
}

pub struct CommandSynchronizer<C, A: CommandRegistrationApi> {
    registry: Arc<CommandRegistry<C>>,
    api: A,
    config: SyncConfig,
}

impl<C, A: CommandRegistrationApi> CommandSynchronizer<C, A> {
    pub fn new(registry: Arc<CommandRegistry<C>>, api: A, config: SyncConfig) -> Self {
        Self {
            registry,
            api,
            config,
        }
    }

    /// Validates inputs and builds the request without touching the network.
    pub fn prepare(&self, scope: SyncScope, mode: SyncMode) -> Result<SyncRequest, SyncError> {
        tracing::debug!(?scope, ?mode, "Sync phase: validating");

        let application_id = self.config.application_id.clone();
        if !is_snowflake(&application_id) {
            return Err(SyncError::Validation(format!(
                "Client id is faulty: {}",
                application_id
            )));
        }

        let route = match &scope {
            SyncScope::Global => CommandRoute::Application { application_id },
            SyncScope::Guild(guild_id) => {
                if !is_snowflake(guild_id) {
                    return Err(SyncError::Validation(format!(
                        "Guild id is faulty: {}",
                        guild_id
                    )));
                }
                CommandRoute::Guild {
                    application_id,
                    guild_id: guild_id.clone(),
                }
            }
        };

        tracing::debug!(?scope, ?mode, "Sync phase: serializing");
        let payload = match mode {
            SyncMode::Clear => Vec::new(),
            SyncMode::Install => install_payload(&self.registry.snapshot(), &scope),
        };

        Ok(SyncRequest {
            scope,
            mode,
            route,
            payload,
        })
    }

    /// Replaces the remote command set for `scope`.
    pub async fn sync(&self, scope: SyncScope, mode: SyncMode) -> Result<SyncSummary, SyncError> {
        let token = self
            .config
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SyncError::Config("Token not defined in environment".to_string()))?;
        if !is_header_safe_token(token) {
            return Err(SyncError::Config(
                "Token contains characters that can't be sent to Discord".to_string(),
            ));
        }

        let request = self.prepare(scope, mode)?;

        tracing::debug!(
            route = %request.route.path(),
            commands = request.payload.len(),
            "Sync phase: sending"
        );
        let count = self
            .api
            .put_commands(&request.route, token, &request.payload)
            .await?;

        Ok(SyncSummary {
            scope: request.scope,
            mode: request.mode,
            count,
        })
    }

    /// Runs a sync and flattens the outcome into a success flag and a line
    /// the admin surface can show as-is. Both outcomes are logged here.
    pub async fn sync_and_report(&self, scope: SyncScope, mode: SyncMode) -> (bool, String) {
        match self.sync(scope.clone(), mode).await {
            Ok(summary) => {
                tracing::info!(?scope, ?mode, count = summary.count, "{}", summary);
                (true, summary.to_string())
            }
            Err(err) => {
                tracing::error!(?scope, ?mode, error = %err, "Command sync failed");
                (false, err.to_string())
            }
        }
    }
}

/// Normalized payload for one install. Everything, hide defaults included,
/// is read from the one snapshot so a concurrent reload can't mix sets.
/// Private commands only ever go to guild scopes.
fn install_payload<C>(set: &CommandSet<C>, scope: &SyncScope) -> Vec<ApplicationCommandPayload> {
    set.descriptors()
        .into_iter()
        .filter(|descriptor| !(descriptor.private && *scope == SyncScope::Global))
        .map(|descriptor| {
            ApplicationCommandPayload::from(&normalize(descriptor, descriptor.default_hide))
        })
        .collect()
}
