//! User-facing chat texts.

use std::fmt::Write as _;

use gbp_analysis::CompletenessReport;

pub const HELP: &str = "Comandos disponibles:\n\
/connect - Conectar tu perfil de Google Business\n\
/code <código> - Completar la conexión con el código de Google\n\
/analyze - Análisis completo de tu perfil con recomendaciones\n\
/score - Puntuación de completitud del perfil\n\
/disconnect - Olvidar tus credenciales\n\
/help - Mostrar esta ayuda";

pub const ANALYZING: &str = "📊 Analizando...";
pub const NOT_CONNECTED: &str = "🔒 Aún no conectaste tu perfil. Usa /connect para empezar.";
pub const CODE_USAGE: &str = "Uso: /code <código que te dio Google>";
pub const NO_PENDING_AUTH: &str =
    "⏱️ No hay una conexión pendiente o ya expiró. Usa /connect para obtener un nuevo enlace.";
pub const CONNECTED: &str =
    "✅ ¡Perfil conectado! Usa /analyze para obtener tu análisis o /score para ver tu puntuación.";
pub const DISCONNECTED: &str = "👋 Tus credenciales fueron eliminadas.";
pub const SESSION_EXPIRED: &str =
    "🔒 Tu sesión de Google expiró. Usa /connect para volver a conectar tu perfil.";
pub const NO_BUSINESS: &str =
    "🤷 No encontramos ninguna cuenta o ubicación de Google Business asociada.";
pub const NOT_A_COMMAND: &str = "No entendí tu mensaje. Usa /help para ver los comandos.";
pub const INTERNAL_ERROR: &str = "❌ Ocurrió un error procesando tu solicitud. Intenta de nuevo.";

#[must_use]
pub fn welcome() -> String {
    format!("👋 ¡Hola! Te ayudo a optimizar tu perfil de Google Business.\n\n{HELP}")
}

#[must_use]
pub fn connect_instructions(authorization_url: &str) -> String {
    format!(
        "🔗 Abre este enlace y autoriza el acceso a tu perfil:\n{authorization_url}\n\n\
         Luego envía el código con /code <código>. El enlace vale 10 minutos."
    )
}

#[must_use]
pub fn code_rejected(reason: &str) -> String {
    format!("❌ Google rechazó el código ({reason}). Usa /connect para intentarlo de nuevo.")
}

/// Renders the completeness report as a chat message.
#[must_use]
pub fn format_completeness(report: &CompletenessReport) -> String {
    let mut text = format!("📋 Completitud del perfil: {}/100\n", report.score);
    for line in report.strengths.iter().chain(&report.issues) {
        let _ = write!(text, "\n{line}");
    }
    let _ = write!(text, "\n\nProblemas detectados: {}", report.issues_count);
    text
}

#[cfg(test)]
mod tests {
    use gbp_analysis::score_profile;
    use gbp_core::BusinessProfile;

    use super::*;

    #[test]
    fn completeness_lists_strengths_then_issues() {
        let report = score_profile(&BusinessProfile {
            title: Some("Acme Cafe".to_string()),
            ..BusinessProfile::default()
        });
        let text = format_completeness(&report);

        assert!(text.starts_with("📋 Completitud del perfil: 10/100"), "{text}");
        let strength = text.find("✅ Nombre del negocio").unwrap();
        let issue = text.find("❌ Categoría del negocio").unwrap();
        assert!(strength < issue);
        assert!(text.ends_with("Problemas detectados: 7"), "{text}");
    }

    #[test]
    fn connect_instructions_include_url() {
        let text = connect_instructions("https://accounts.google.com/o/oauth2/auth?x=1");
        assert!(text.contains("https://accounts.google.com/o/oauth2/auth?x=1"));
        assert!(text.contains("/code"));
    }
}
