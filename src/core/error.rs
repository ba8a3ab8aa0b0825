//=========================================================================
// Scene Errors
//=========================================================================
//
// Error types surfaced by the orchestrator and its collaborators.
//
// Propagation:
//   ContentLoader ── LoadError ──> handled locally (transition aborted)
//   Scene hooks   ── HookError ──> SceneError::Hook, returned by update()
//   Usage errors  ─────────────> SceneError, returned to the caller
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== HookPhase ===========================================================

/// Identifies the hook that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    TransitionStart,
    Leave,
    LoadScene,
    UnloadScene,
    Prepare,
    TransitionFinish,
    Enter,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TransitionStart => "transition start",
            Self::Leave => "leave",
            Self::LoadScene => "load scene",
            Self::UnloadScene => "unload scene",
            Self::Prepare => "prepare",
            Self::TransitionFinish => "transition finish",
            Self::Enter => "enter",
        };
        f.write_str(name)
    }
}

//=== HookError ===========================================================

/// Failure reported by a scene or node hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HookError {}

//=== LoadError ===========================================================

/// Failure reported by a content loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The loader does not know the requested identifier.
    NotFound(String),

    /// The loader failed while reading or instantiating the unit.
    Failed(String),

    /// The loader dropped the request without answering.
    Abandoned,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "Content unit not found: {}", what),
            Self::Failed(reason) => write!(f, "Content unit failed to load: {}", reason),
            Self::Abandoned => write!(f, "Content loader abandoned the request"),
        }
    }
}

impl std::error::Error for LoadError {}

//=== SceneError ==========================================================

/// Errors returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Loading a content unit failed.
    Load(LoadError),

    /// Unloading a content unit failed.
    Unload(LoadError),

    /// A hook reported an error.
    Hook { phase: HookPhase, source: HookError },

    /// A hook dropped its task without completing it.
    HookAbandoned(HookPhase),

    /// Only additive scenes may be removed individually.
    NotAdditive,

    /// The scene instance is not tracked by this orchestrator.
    UnknownInstance,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Scene load failed: {}", e),
            Self::Unload(e) => write!(f, "Scene unload failed: {}", e),
            Self::Hook { phase, source } => write!(f, "Scene {} hook failed: {}", phase, source),
            Self::HookAbandoned(phase) => write!(f, "Scene {} hook was abandoned", phase),
            Self::NotAdditive => write!(f, "Only additive scenes can be removed"),
            Self::UnknownInstance => write!(f, "Scene instance is not loaded"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) | Self::Unload(e) => Some(e),
            Self::Hook { source, .. } => Some(source),
            _ => None,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn hook_error_display_names_phase() {
        let err = SceneError::Hook {
            phase: HookPhase::Prepare,
            source: HookError::new("missing asset"),
        };

        assert_eq!(err.to_string(), "Scene prepare hook failed: missing asset");
        assert!(err.source().is_some());
    }

    #[test]
    fn load_error_is_source_of_scene_error() {
        let err = SceneError::Load(LoadError::NotFound("Title".to_string()));

        assert_eq!(err.to_string(), "Scene load failed: Content unit not found: Title");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Content unit not found: Title".to_string())
        );
    }

    #[test]
    fn usage_errors_have_no_source() {
        assert!(SceneError::NotAdditive.source().is_none());
        assert!(SceneError::UnknownInstance.source().is_none());
    }
}
