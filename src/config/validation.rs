//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the route tree: names, sibling uniqueness, pattern shape
//! - Validate value ranges (gate timeout > 0, known log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{ManagerConfig, RouteConfig};
use crate::observability::logging::is_known_level;
use crate::routing::matcher::RoutePattern;
use crate::routing::types::STATE_SEPARATOR;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route at '{0}' has an empty name")]
    EmptyName(String),

    #[error("route name '{0}' must not contain '.'")]
    DottedName(String),

    #[error("duplicate route '{0}'")]
    DuplicateRoute(String),

    #[error("route '{0}' declares both pattern and regex")]
    ConflictingPattern(String),

    #[error("route '{0}' declares captures without a regex")]
    OrphanCaptures(String),

    #[error("route '{route}': {reason}")]
    InvalidPattern { route: String, reason: String },

    #[error("navigation.gate_timeout_ms must be greater than zero")]
    ZeroGateTimeout,

    #[error("navigation.neutral_state '{0}' shadows a root route")]
    NeutralStateShadowed(String),

    #[error("navigation.neutral_state must not be empty")]
    EmptyNeutralState,

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.navigation.gate_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroGateTimeout);
    }

    let neutral = &config.navigation.neutral_state;
    if neutral.is_empty() {
        errors.push(ValidationError::EmptyNeutralState);
    } else if config.routes.iter().any(|route| &route.name == neutral) {
        errors.push(ValidationError::NeutralStateShadowed(neutral.clone()));
    }

    if !is_known_level(&config.observability.log_level) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    validate_routes(&config.routes, "", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(routes: &[RouteConfig], parent: &str, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for route in routes {
        let path = if parent.is_empty() {
            route.name.clone()
        } else {
            format!("{}{}{}", parent, STATE_SEPARATOR, route.name)
        };

        if route.name.is_empty() {
            errors.push(ValidationError::EmptyName(parent.to_string()));
        } else if route.name.contains(STATE_SEPARATOR) {
            errors.push(ValidationError::DottedName(route.name.clone()));
        }
        if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(path.clone()));
        }

        match (&route.pattern, &route.regex) {
            (Some(_), Some(_)) => errors.push(ValidationError::ConflictingPattern(path.clone())),
            (Some(pattern), None) => {
                if let Err(e) = RoutePattern::parse(&path, pattern) {
                    errors.push(ValidationError::InvalidPattern {
                        route: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            (None, Some(regex)) => {
                if let Err(e) = RoutePattern::regex(&path, regex, route.captures.clone()) {
                    errors.push(ValidationError::InvalidPattern {
                        route: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            (None, None) => {}
        }
        if route.regex.is_none() && !route.captures.is_empty() {
            errors.push(ValidationError::OrphanCaptures(path.clone()));
        }

        validate_routes(&route.children, &path, errors);
    }
}
