//! Response Locale
//!
//! Fixed sentences returned at the request boundary when no model-produced
//! answer is available.

use serde::{Deserialize, Serialize};

/// Language used for fixed responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Parse a locale tag such as `en`, `es`, `es-CO`. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Returned when the agent failed to initialize
    pub const fn initialization_failure(self) -> &'static str {
        match self {
            Self::En => "Error: Agent not initialized. Check API key.",
            Self::Es => "Error: el agente no está inicializado. Verifique la clave de API.",
        }
    }

    /// Returned when the turn produced no usable final answer
    pub const fn fallback_answer(self) -> &'static str {
        match self {
            Self::En => "Could not generate an answer. Please rephrase the question.",
            Self::Es => "No se pudo generar una respuesta. Por favor, reformula la pregunta.",
        }
    }

    /// Final answer when the iteration bound is exhausted
    pub const fn could_not_complete(self) -> &'static str {
        match self {
            Self::En => "Could not complete the request within the allowed number of steps.",
            Self::Es => "No se pudo completar la solicitud dentro del número de pasos permitido.",
        }
    }

    /// Returned when the gateway or a tool failed mid-turn
    pub const fn generic_failure(self) -> &'static str {
        match self {
            Self::En => "An error occurred while processing the request. Please try again later.",
            Self::Es => "Ocurrió un error al procesar la solicitud. Por favor, inténtalo más tarde.",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Es => write!(f, "es"),
        }
    }
}
