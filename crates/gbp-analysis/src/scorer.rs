//! Weighted completeness score for a business profile.
//!
//! Scores range from 0 to 100 and reflect how thoroughly the public-facing
//! fields of a profile are filled out. Strength and issue messages are in
//! Spanish, matching the report language.

use gbp_core::BusinessProfile;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubricField {
    Title,
    Category,
    Description,
    Phone,
    Website,
    Address,
    Hours,
    Photos,
}

#[derive(Debug, Clone, Copy)]
pub struct RubricItem {
    pub field: RubricField,
    pub label: &'static str,
    pub weight: u32,
}

/// Checked fields in evaluation order.
///
/// The weights add up to 90, not 100: a fully completed profile scores 90.
/// The table is kept as-is until the intended weighting is confirmed.
pub const RUBRIC: &[RubricItem] = &[
    RubricItem {
        field: RubricField::Title,
        label: "Nombre del negocio",
        weight: 10,
    },
    RubricItem {
        field: RubricField::Category,
        label: "Categoría del negocio",
        weight: 10,
    },
    RubricItem {
        field: RubricField::Description,
        label: "Descripción completa",
        weight: 15,
    },
    RubricItem {
        field: RubricField::Phone,
        label: "Número de teléfono",
        weight: 10,
    },
    RubricItem {
        field: RubricField::Website,
        label: "Sitio web",
        weight: 10,
    },
    RubricItem {
        field: RubricField::Address,
        label: "Dirección completa",
        weight: 15,
    },
    RubricItem {
        field: RubricField::Hours,
        label: "Horarios de atención",
        weight: 10,
    },
    RubricItem {
        field: RubricField::Photos,
        label: "Fotos del negocio",
        weight: 10,
    },
];

/// Upper bound applied to the summed weights.
pub const MAX_SCORE: u32 = 100;

/// A description counts only when strictly longer than this many characters.
pub const DESCRIPTION_MIN_CHARS: usize = 100;

/// Minimum number of photos for the photo check to pass.
pub const MIN_PHOTOS: usize = 5;

const fn rubric_total() -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < RUBRIC.len() {
        total += RUBRIC[i].weight;
        i += 1;
    }
    total
}

// Compile-time record of the current weighting (see `RUBRIC`).
const _: () = assert!(
    rubric_total() == 90,
    "rubric weights changed: update RUBRIC docs and the full-profile tests"
);

/// Result of scoring one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessReport {
    /// 0-100; sum of granted weights, capped at [`MAX_SCORE`].
    pub score: u8,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub issues_count: usize,
}

enum Outcome {
    Missing,
    Strength(&'static str),
    Issue(&'static str),
    Skipped,
}

/// Score a profile against [`RUBRIC`].
///
/// A missing or empty field records a "missing" issue. A present field
/// grants its weight and records a strength, except that:
/// - a description of [`DESCRIPTION_MIN_CHARS`] characters or fewer is
///   skipped without a strength or an issue;
/// - fewer than [`MIN_PHOTOS`] photos records an issue and no weight.
#[must_use]
pub fn score_profile(profile: &BusinessProfile) -> CompletenessReport {
    let mut total = 0u32;
    let mut strengths = Vec::new();
    let mut issues = Vec::new();

    for item in RUBRIC {
        match evaluate(item.field, profile) {
            Outcome::Missing => issues.push(format!("❌ {}: Falta completar", item.label)),
            Outcome::Strength(detail) => {
                total += item.weight;
                strengths.push(format!("✅ {}: {detail}", item.label));
            }
            Outcome::Issue(detail) => issues.push(format!("⚠️ {}: {detail}", item.label)),
            Outcome::Skipped => {}
        }
    }

    let score = u8::try_from(total.min(MAX_SCORE)).unwrap_or(u8::MAX);
    let issues_count = issues.len();
    CompletenessReport {
        score,
        strengths,
        issues,
        issues_count,
    }
}

fn evaluate(field: RubricField, profile: &BusinessProfile) -> Outcome {
    const COMPLETED: &str = "Completado";

    let text = |value: &Option<String>| {
        if has_text(value.as_deref()) {
            Outcome::Strength(COMPLETED)
        } else {
            Outcome::Missing
        }
    };

    match field {
        RubricField::Title => text(&profile.title),
        RubricField::Category => text(&profile.category),
        RubricField::Phone => text(&profile.phone_number),
        RubricField::Website => text(&profile.website_url),
        RubricField::Description => match profile.description.as_deref() {
            Some(d) if !d.is_empty() => {
                if d.chars().count() > DESCRIPTION_MIN_CHARS {
                    Outcome::Strength("Completa y detallada")
                } else {
                    Outcome::Skipped
                }
            }
            _ => Outcome::Missing,
        },
        RubricField::Address => match &profile.address {
            Some(address) if !address.is_blank() => Outcome::Strength(COMPLETED),
            _ => Outcome::Missing,
        },
        RubricField::Hours => match &profile.business_hours {
            Some(hours) if json_present(hours) => Outcome::Strength(COMPLETED),
            _ => Outcome::Missing,
        },
        RubricField::Photos => match profile.photos.as_deref() {
            None | Some([]) => Outcome::Missing,
            Some(photos) if photos.len() >= MIN_PHOTOS => {
                Outcome::Strength("Hay suficientes fotos")
            }
            Some(_) => Outcome::Issue("Se recomienda agregar más fotos"),
        },
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty())
}

/// JSON values that carry no content (null, false, 0, "", [], {}) count as absent.
fn json_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
