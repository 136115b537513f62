//! Routing Decision
//!
//! Decides what follows a model reply: dispatch tools, commit the reply
//! verbatim, or route it through the Finalizing node.

use crate::turn::ModelUtterance;

/// Edge taken after the model node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Dispatch the pending tool invocations
    Continue,
    /// The reply is already final
    End,
    /// Commit the reply through the Finalizing node
    Finalize,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::End => write!(f, "end"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// How a reply without tool calls is recognized as final
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RoutingPolicy {
    /// Use the `terminal` flag set by the model node
    #[default]
    Structural,

    /// Look for literal markers in the reply text
    SourceMarkers(Vec<String>),
}

impl RoutingPolicy {
    /// Route a freshly appended model reply. Pending calls always win.
    pub fn route(&self, utterance: &ModelUtterance) -> Route {
        if utterance.has_pending_calls() {
            return Route::Continue;
        }

        let terminal = match self {
            Self::Structural => utterance.terminal,
            Self::SourceMarkers(markers) => markers
                .iter()
                .any(|m| !m.is_empty() && utterance.text.contains(m.as_str())),
        };

        if terminal { Route::End } else { Route::Finalize }
    }
}
