//! Navigation entry and spoken/announced prompts.
//!
//! Decides what happens when the user starts navigating and which prompts
//! apply given their preferences. Speech output and screen-reader posting are
//! left to the caller.

use tracing::{debug, info};

use crate::error::Result;
use crate::preferences::Preferences;
use crate::routes::{Route, RouteStore};

/// Announcement posted when a text field gains focus with Braille input on.
pub const BRAILLE_ANNOUNCEMENT: &str =
    "Braille input is enabled. Use VoiceOver's Braille Screen Input to type.";

/// On-screen calibration instruction.
pub const CALIBRATION_TEXT: &str = "Move iPhone to calibrate";

/// Spoken calibration instruction.
pub const CALIBRATION_SPEECH: &str = "Move iPhone around slowly to scan the environment";

/// What the user entered on the navigation screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationRequest {
    /// Starting location label.
    pub from: String,
    /// Destination label.
    pub to: String,
    /// The "save route?" toggle.
    pub save_route: bool,
}

/// Result of [`begin_navigation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// The route being navigated, if both labels were given.
    pub route: Option<Route>,
    /// Whether the route was appended to the saved list.
    pub saved: bool,
}

/// Start navigating.
///
/// The route is saved when both labels are non-empty and either the request
/// asks for it or the user has turned on automatic saving.
///
/// # Errors
///
/// Returns an error if the route list cannot be persisted.
pub fn begin_navigation(
    request: &NavigationRequest,
    prefs: &Preferences,
    routes: &mut RouteStore,
) -> Result<NavigationOutcome> {
    if request.from.is_empty() || request.to.is_empty() {
        debug!("Navigation started without a complete route");
        return Ok(NavigationOutcome {
            route: None,
            saved: false,
        });
    }

    let route = Route::new(request.from.as_str(), request.to.as_str());
    let saved = request.save_route || prefs.auto_save_routes;
    if saved {
        routes.save_route(route.clone())?;
    }

    info!(
        "Navigating {} via {} (saved: {})",
        route,
        prefs.preferred_route_type.label(),
        saved
    );
    Ok(NavigationOutcome {
        route: Some(route),
        saved,
    })
}

/// The Braille hint to announce when a field starts editing, if any.
#[must_use]
pub fn braille_announcement(prefs: &Preferences, editing: bool) -> Option<&'static str> {
    (editing && prefs.enable_braille_input).then_some(BRAILLE_ANNOUNCEMENT)
}

/// Calibration instruction and whether it should be spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPrompt {
    /// Text shown on screen.
    pub text: &'static str,
    /// Text to speak, when speech applies.
    pub speech: Option<&'static str>,
}

/// Build the calibration prompt. Speech requires audio assistance and is
/// suppressed while voice guidance is muted.
#[must_use]
pub fn calibration_prompt(prefs: &Preferences) -> CalibrationPrompt {
    let speak = prefs.use_audio_assistance && !prefs.mute_voice_guidance;
    CalibrationPrompt {
        text: CALIBRATION_TEXT,
        speech: speak.then_some(CALIBRATION_SPEECH),
    }
}
