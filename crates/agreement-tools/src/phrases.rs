//! Localized Phrases
//!
//! Source-attribution lines, the not-found sentence and the system prompt.
//! The first two are the markers that tag tool text as final.

use agent_core::Locale;

/// First line of every non-empty tool result
pub fn source_line(locale: Locale, tables: &[&str]) -> String {
    let joined = tables.join(" y ");
    match locale {
        Locale::En => format!("Source: {joined}"),
        Locale::Es if tables.len() > 1 => format!("Fuente: Tablas {joined}"),
        Locale::Es => format!("Fuente: Tabla {joined}"),
    }
}

/// Full text returned for an empty result set
pub fn not_found(locale: Locale, agreement_id: &str) -> String {
    match locale {
        Locale::En => format!("No information found for agreement {agreement_id}."),
        Locale::Es => format!("No se encontró información para el acuerdo {agreement_id}."),
    }
}

/// Literal prefixes recognized by the marker routing policy
pub fn terminal_markers(locale: Locale) -> Vec<String> {
    match locale {
        Locale::En => vec!["Source: ".into(), "No information found for agreement".into()],
        Locale::Es => vec!["Fuente: ".into(), "No se encontró información para el acuerdo".into()],
    }
}

/// System prompt for the agreement assistant
pub const fn system_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::En => SYSTEM_PROMPT_EN,
        Locale::Es => SYSTEM_PROMPT_ES,
    }
}

const SYSTEM_PROMPT_EN: &str = "You are a helpful conversational assistant that answers questions about \
customer data, energy consumption and field activities. Use the available tools to answer: \
`query_customer_master` for the customer record of an agreement, `query_consumption_records` for its \
consumption history and `query_field_activities` for the field work done at its service point. \
If the tools do not provide the information, say politely that you do not have it. \
Answer in the language the user writes in.";

const SYSTEM_PROMPT_ES: &str = "Eres un asistente conversacional útil diseñado para responder preguntas \
sobre datos de clientes, consumo y actividades de campo. Utiliza las herramientas disponibles para \
responder. Responde en el idioma del usuario; si no es claro, responde en español. Si las \
herramientas no proporcionan la información, responde de manera cortés indicando que no tienes la \
información.";
