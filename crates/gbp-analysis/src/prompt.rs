//! Prompt compilation for the optimization report.
//!
//! Renders a profile and its performance counters into the Spanish
//! instruction text sent to the text-generation backend. Pure and
//! deterministic: the same inputs always produce the same bytes.

use std::borrow::Cow;

use gbp_core::{BusinessProfile, PerformanceMetrics};
use serde_json::Value;

/// Placeholder rendered for any absent profile field.
pub const PLACEHOLDER: &str = "N/A";

/// Descriptions longer than this many characters are truncated in the prompt.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Trailing window covered by the performance counters, unless configured otherwise.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

const TRUNCATION_MARKER: &str = "...";

const INSTRUCTIONS: &str = "Eres un experto en optimización de Google My Business (GMB).
Analiza el siguiente perfil de negocio y proporciona un reporte detallado en español con:

1. **Puntuación General** (0-100): Califica la optimización del perfil
2. **Análisis Fortalezas**: Qué está bien hecho
3. **Áreas de Mejora**: Qué se puede optimizar
4. **Recomendaciones Prioritarias**: Top 3 acciones para mejorar visibilidad
5. **Estimación de Impacto**: Qué resultados se podrían esperar";

const CLOSING: &str = "Sé específico, conciso y accionable. Usa emojis para hacerlo legible.
Proporciona recomendaciones que el usuario pueda implementar hoy mismo.";

/// Compiled prompt text. Built once per analysis request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AnalysisPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compile the report prompt for the default 30-day window.
#[must_use]
pub fn compile_prompt(profile: &BusinessProfile, metrics: &PerformanceMetrics) -> AnalysisPrompt {
    compile_prompt_for_window(profile, metrics, DEFAULT_WINDOW_DAYS)
}

/// Compile the report prompt, labelling the metrics with `window_days`.
#[must_use]
pub fn compile_prompt_for_window(
    profile: &BusinessProfile,
    metrics: &PerformanceMetrics,
    window_days: u32,
) -> AnalysisPrompt {
    let description = profile
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map_or(Cow::Borrowed(PLACEHOLDER), |d| {
            truncate_chars(d, DESCRIPTION_PREVIEW_CHARS)
        });

    let profile_info = format!(
        "## Información del Perfil:
- Nombre: {name}
- Categoría: {category}
- Teléfono: {phone}
- Sitio web: {website}
- Descripción: {description}
- Dirección: {address}
- Horarios: {hours}
- Fotos: {photos} fotos subidas",
        name = or_placeholder(profile.title.as_deref()),
        category = or_placeholder(profile.category.as_deref()),
        phone = or_placeholder(profile.phone_number.as_deref()),
        website = or_placeholder(profile.website_url.as_deref()),
        address = or_placeholder(profile.first_address_line()),
        hours = render_hours(profile.business_hours.as_ref()),
        photos = profile.photo_count(),
    );

    let performance_info = format!(
        "## Métricas (últimos {window_days} días):
- Vistas: {views}
- Búsquedas directas: {direct}
- Búsquedas indirectas: {indirect}
- Llamadas: {calls}
- Direcciones solicitadas: {directions}
- Clics al sitio: {clicks}",
        views = group_thousands(metrics.views),
        direct = group_thousands(metrics.queries_direct),
        indirect = group_thousands(metrics.queries_indirect),
        calls = group_thousands(metrics.calls),
        directions = group_thousands(metrics.directions),
        clicks = group_thousands(metrics.website_clicks),
    );

    AnalysisPrompt(format!(
        "{INSTRUCTIONS}\n\n{profile_info}\n\n{performance_info}\n\n{CLOSING}"
    ))
}

fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER)
}

/// Free-text hours are rendered verbatim; structured hours as compact JSON.
fn render_hours(hours: Option<&Value>) -> Cow<'_, str> {
    match hours {
        None | Some(Value::Null) => Cow::Borrowed(PLACEHOLDER),
        Some(Value::String(s)) if s.is_empty() => Cow::Borrowed(PLACEHOLDER),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Keep the first `max_chars` characters, appending the marker only when
/// something was actually cut.
fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..byte_idx])),
        None => Cow::Borrowed(text),
    }
}

/// `1234567` → `"1,234,567"`.
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use gbp_core::PostalAddress;
    use serde_json::json;

    use super::*;

    fn acme() -> BusinessProfile {
        BusinessProfile {
            title: Some("Acme Cafe".to_string()),
            category: Some("Restaurant".to_string()),
            phone_number: Some("555-1234".to_string()),
            website_url: None,
            description: Some("A cozy place for coffee and pastries....".to_string()),
            address: Some(PostalAddress {
                address_lines: vec!["1 Main St".to_string(), "Suite 9".to_string()],
                ..PostalAddress::default()
            }),
            business_hours: Some(json!("9-5")),
            photos: Some(vec![]),
        }
    }

    #[test]
    fn group_thousands_formats_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123_456), "123,456");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(
            group_thousands(u64::MAX),
            "18,446,744,073,709,551,615"
        );
    }

    #[test]
    fn truncation_marker_only_when_cut() {
        assert_eq!(truncate_chars("short", 200), "short");
        let exact = "a".repeat(200);
        assert_eq!(truncate_chars(&exact, 200), exact.as_str());
        let long = "b".repeat(201);
        assert_eq!(truncate_chars(&long, 200), format!("{}...", "b".repeat(200)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(250);
        let cut = truncate_chars(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("é..."));
    }

    #[test]
    fn prompt_embeds_profile_and_metrics() {
        let metrics = PerformanceMetrics {
            views: 120,
            calls: 5,
            queries_indirect: 12_345,
            ..PerformanceMetrics::default()
        };
        let prompt = compile_prompt(&acme(), &metrics);
        let text = prompt.as_str();

        assert!(text.contains("- Nombre: Acme Cafe"));
        assert!(text.contains("- Categoría: Restaurant"));
        assert!(text.contains("- Teléfono: 555-1234"));
        assert!(text.contains("- Sitio web: N/A"));
        assert!(text.contains("- Descripción: A cozy place for coffee and pastries....\n"));
        assert!(text.contains("- Dirección: 1 Main St\n"));
        assert!(text.contains("- Horarios: 9-5"));
        assert!(text.contains("- Fotos: 0 fotos subidas"));
        assert!(text.contains("## Métricas (últimos 30 días):"));
        assert!(text.contains("- Vistas: 120"));
        assert!(text.contains("- Búsquedas indirectas: 12,345"));
        assert!(text.contains("- Llamadas: 5"));
        assert!(text.contains("- Clics al sitio: 0"));
    }

    #[test]
    fn prompt_requests_all_five_sections() {
        let prompt = compile_prompt(&BusinessProfile::default(), &PerformanceMetrics::default());
        for section in [
            "**Puntuación General** (0-100)",
            "**Análisis Fortalezas**",
            "**Áreas de Mejora**",
            "**Recomendaciones Prioritarias**: Top 3",
            "**Estimación de Impacto**",
        ] {
            assert!(prompt.as_str().contains(section), "missing {section}");
        }
    }

    #[test]
    fn empty_profile_uses_placeholders() {
        let prompt = compile_prompt(&BusinessProfile::default(), &PerformanceMetrics::default());
        let text = prompt.as_str();
        assert!(text.contains("- Nombre: N/A"));
        assert!(text.contains("- Descripción: N/A\n"));
        assert!(text.contains("- Dirección: N/A"));
        assert!(text.contains("- Horarios: N/A"));
        assert!(!text.contains("N/A..."));
    }

    #[test]
    fn scored_address_is_never_shown_as_placeholder() {
        let profile = BusinessProfile {
            address: Some(PostalAddress {
                address_lines: vec![String::new()],
                locality: Some("Springfield".to_string()),
                ..PostalAddress::default()
            }),
            ..BusinessProfile::default()
        };
        let prompt = compile_prompt(&profile, &PerformanceMetrics::default());
        assert!(prompt.as_str().contains("- Dirección: Springfield\n"));
    }

    #[test]
    fn structured_hours_render_as_json() {
        let profile = BusinessProfile {
            business_hours: Some(json!({ "periods": [] })),
            ..BusinessProfile::default()
        };
        let prompt = compile_prompt(&profile, &PerformanceMetrics::default());
        assert!(prompt.as_str().contains(r#"- Horarios: {"periods":[]}"#));
    }

    #[test]
    fn custom_window_is_labelled() {
        let prompt = compile_prompt_for_window(
            &BusinessProfile::default(),
            &PerformanceMetrics::default(),
            7,
        );
        assert!(prompt.as_str().contains("## Métricas (últimos 7 días):"));
    }

    #[test]
    fn compilation_is_deterministic() {
        let metrics = PerformanceMetrics {
            views: 4_500,
            ..PerformanceMetrics::default()
        };
        let a = compile_prompt(&acme(), &metrics);
        let b = compile_prompt(&acme(), &metrics);
        assert_eq!(a.as_str().as_bytes(), b.as_str().as_bytes());
    }
}
