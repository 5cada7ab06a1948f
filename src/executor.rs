//! Action execution - permission-checked dispatch of action descriptors.
//!
//! Extensions describe what should happen as serializable `ActionData`
//! values rather than callbacks, because a result may cross an isolation
//! boundary before the user picks it. The `ActionExecutor` consumes one
//! descriptor, enforces the owning extension's permissions through the
//! sandbox registry, and hands the literal work to the opaque capability
//! bridge.

use std::sync::Arc;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::{PipelineError, PipelineResult};
use crate::extensions::permissions::required_permission;
use crate::extensions::SandboxRegistry;

/// Payload for `popup` actions: show content on the host's display surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PopupPayload {
    pub title: String,

    #[serde(default)]
    pub body: String,
}

/// Payload for `clipboard` actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub text: String,

    /// Optional confirmation to show after the write.
    #[serde(default)]
    pub notification: Option<String>,
}

/// Payload for `open-url` actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenUrlPayload {
    pub url: String,
}

/// A serializable description of the action a result performs.
///
/// Wire shape is `{ "type": <tag>, "data": <payload> }` with kebab-case
/// tags. Tags this executor does not know deserialize into `Unknown`
/// instead of failing, so an older executor never chokes on an action
/// emitted by a newer extension schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionData {
    Popup(PopupPayload),
    Clipboard(ClipboardPayload),
    OpenUrl(OpenUrlPayload),
    /// Forward-compatible extensibility slot; payload shape is not assumed.
    Custom(Value),
    /// Explicit, intentional no-op - distinct from "unhandled".
    None,
    /// An action tag from a newer schema. Preserved losslessly.
    Unknown { kind: String, data: Value },
}

impl Default for ActionData {
    fn default() -> Self {
        ActionData::None
    }
}

impl ActionData {
    pub fn popup(title: impl Into<String>, body: impl Into<String>) -> Self {
        ActionData::Popup(PopupPayload {
            title: title.into(),
            body: body.into(),
        })
    }

    pub fn clipboard(text: impl Into<String>) -> Self {
        ActionData::Clipboard(ClipboardPayload {
            text: text.into(),
            notification: None,
        })
    }

    pub fn open_url(url: impl Into<String>) -> Self {
        ActionData::OpenUrl(OpenUrlPayload { url: url.into() })
    }

    /// The wire tag, used for logging and error messages.
    pub fn kind(&self) -> &str {
        match self {
            ActionData::Popup(_) => "popup",
            ActionData::Clipboard(_) => "clipboard",
            ActionData::OpenUrl(_) => "open-url",
            ActionData::Custom(_) => "custom",
            ActionData::None => "none",
            ActionData::Unknown { kind, .. } => kind,
        }
    }
}

/// The raw `{ type, data }` wire record.
#[derive(Debug, Serialize, Deserialize)]
struct ActionEnvelope {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    data: Value,
}

impl ActionData {
    fn from_envelope(envelope: ActionEnvelope) -> Result<Self, serde_json::Error> {
        let ActionEnvelope { kind, data } = envelope;
        Ok(match kind.as_str() {
            "popup" => ActionData::Popup(serde_json::from_value(data)?),
            "clipboard" => ActionData::Clipboard(serde_json::from_value(data)?),
            "open-url" => ActionData::OpenUrl(serde_json::from_value(data)?),
            "custom" => ActionData::Custom(data),
            "none" => ActionData::None,
            _ => ActionData::Unknown { kind, data },
        })
    }

    fn to_envelope(&self) -> Result<ActionEnvelope, serde_json::Error> {
        let (kind, data) = match self {
            ActionData::Popup(payload) => ("popup".to_string(), serde_json::to_value(payload)?),
            ActionData::Clipboard(payload) => {
                ("clipboard".to_string(), serde_json::to_value(payload)?)
            }
            ActionData::OpenUrl(payload) => ("open-url".to_string(), serde_json::to_value(payload)?),
            ActionData::Custom(data) => ("custom".to_string(), data.clone()),
            ActionData::None => ("none".to_string(), Value::Null),
            ActionData::Unknown { kind, data } => (kind.clone(), data.clone()),
        };
        Ok(ActionEnvelope { kind, data })
    }
}

impl Serialize for ActionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = self.to_envelope().map_err(S::Error::custom)?;
        envelope.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = ActionEnvelope::deserialize(deserializer)?;
        ActionData::from_envelope(envelope).map_err(D::Error::custom)
    }
}

/// What the executor did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The primary capability path succeeded.
    Performed,
    /// The primary path failed and the documented fallback succeeded.
    PerformedWithFallback,
    /// The action was an explicit `none`.
    NoOp,
    /// The action tag was not recognized; logged and skipped.
    Unrecognized,
}

/// The opaque capability primitive supplied by the host.
///
/// The executor only decides *whether* to call; the literal clipboard,
/// display, and URL work lives behind this trait.
pub trait CapabilityBridge: Send + Sync {
    fn call(&self, capability: &str, args: &Value) -> Result<Value, String>;
}

/// Permission-checked dispatcher keyed on the action tag.
pub struct ActionExecutor {
    bridge: Arc<dyn CapabilityBridge>,
}

impl ActionExecutor {
    pub fn new(bridge: Arc<dyn CapabilityBridge>) -> Self {
        Self { bridge }
    }

    /// Execute one action descriptor.
    ///
    /// `source` is the owning extension id when the action came from an
    /// extension result; static results have no sandbox subject and skip
    /// the permission gate. The gate runs before any bridge call.
    pub fn execute(
        &self,
        action: &ActionData,
        source: Option<&str>,
        sandbox: &SandboxRegistry,
    ) -> PipelineResult<ActionOutcome> {
        match action {
            ActionData::Popup(payload) => {
                let args = serde_json::to_value(payload)?;
                self.call_with_fallback("popup.show", "notify.send", args, source, sandbox)
            }
            ActionData::Clipboard(payload) => {
                let args = serde_json::to_value(payload)?;
                self.call_with_fallback(
                    "clipboard.write",
                    "clipboard.write.fallback",
                    args,
                    source,
                    sandbox,
                )
            }
            ActionData::OpenUrl(payload) => {
                let args = serde_json::to_value(payload)?;
                self.check_permission("url.open", source, sandbox)?;
                match self.bridge.call("url.open", &args) {
                    Ok(_) => Ok(ActionOutcome::Performed),
                    Err(message) => Err(PipelineError::ActionFailed {
                        action: "open-url".to_string(),
                        message,
                    }),
                }
            }
            ActionData::Custom(data) => {
                self.check_permission("custom.invoke", source, sandbox)?;
                match self.bridge.call("custom.invoke", data) {
                    Ok(_) => Ok(ActionOutcome::Performed),
                    Err(message) => Err(PipelineError::ActionFailed {
                        action: "custom".to_string(),
                        message,
                    }),
                }
            }
            ActionData::None => Ok(ActionOutcome::NoOp),
            ActionData::Unknown { kind, .. } => {
                warn!(kind = kind.as_str(), "ignoring unrecognized action type");
                Ok(ActionOutcome::Unrecognized)
            }
        }
    }

    /// Try the primary capability, degrade to the fallback on failure.
    /// Both paths sit behind the same permission token, so one check covers
    /// them.
    fn call_with_fallback(
        &self,
        primary: &str,
        fallback: &str,
        args: Value,
        source: Option<&str>,
        sandbox: &SandboxRegistry,
    ) -> PipelineResult<ActionOutcome> {
        self.check_permission(primary, source, sandbox)?;

        let primary_error = match self.bridge.call(primary, &args) {
            Ok(_) => return Ok(ActionOutcome::Performed),
            Err(message) => message,
        };

        warn!(
            capability = primary,
            error = primary_error.as_str(),
            "primary capability failed, degrading to fallback"
        );

        match self.bridge.call(fallback, &args) {
            Ok(_) => Ok(ActionOutcome::PerformedWithFallback),
            Err(message) => Err(PipelineError::ActionFailed {
                action: primary.to_string(),
                message: format!("{primary_error}; fallback: {message}"),
            }),
        }
    }

    fn check_permission(
        &self,
        capability: &str,
        source: Option<&str>,
        sandbox: &SandboxRegistry,
    ) -> PipelineResult<()> {
        let Some(token) = required_permission(capability) else {
            return Ok(());
        };

        let Some(extension) = source else {
            // Static results carry no sandbox subject; the host trusts its
            // own candidates.
            return Ok(());
        };

        if sandbox.has_permission(extension, token) {
            Ok(())
        } else {
            Err(PipelineError::PermissionDenied {
                extension: extension.to_string(),
                permission: token.to_string(),
            })
        }
    }
}
