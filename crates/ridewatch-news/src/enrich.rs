//! Keyword enrichment of news text: competitors, topics, category, sentiment.
//!
//! All matching is case-insensitive substring search over the lowercased text,
//! so every keyword in the tables is lowercase.

use ridewatch_core::model::Sentiment;

/// A competitor as it is named in the press.
pub struct CompetitorAliases {
  pub slug:    &'static str,
  pub name:    &'static str,
  pub aliases: &'static [&'static str],
}

pub const COMPETITORS: &[CompetitorAliases] = &[
  CompetitorAliases { slug: "yango", name: "Yango", aliases: &["yango"] },
  CompetitorAliases {
    slug:    "indrive",
    name:    "inDrive",
    aliases: &["indrive", "in drive", "in-drive", "kuzoba"],
  },
  CompetitorAliases { slug: "uber", name: "Uber", aliases: &["uber"] },
  CompetitorAliases { slug: "didi", name: "DiDi", aliases: &["didi"] },
  CompetitorAliases { slug: "cabify", name: "Cabify", aliases: &["cabify"] },
  CompetitorAliases { slug: "rappi", name: "Rappi", aliases: &["rappi"] },
  CompetitorAliases { slug: "bolt", name: "Bolt", aliases: &["bolt"] },
  CompetitorAliases { slug: "beat", name: "Beat", aliases: &["beat"] },
];

const TOPICS: &[(&str, &[&str])] = &[
  ("pricing", &["precio", "tarifa", "comisión", "costo", "price", "fare"]),
  ("safety", &["seguridad", "safety", "sos", "emergencia", "robo", "asalto"]),
  ("regulation", &[
    "regulación",
    "ley",
    "gobierno",
    "municipal",
    "regulation",
    "mtc",
    "atu",
  ]),
  ("expansion", &["expansión", "nuevo mercado", "lanzamiento", "expansion"]),
  ("drivers", &["conductor", "driver", "chofer", "ganancias"]),
  ("promo", &["promoción", "descuento", "oferta", "promo", "discount", "cupón"]),
  ("technology", &[
    "app",
    "aplicación",
    "tecnología",
    "actualización",
    "feature",
    "función",
  ]),
  ("labor", &["paro", "huelga", "protesta", "strike"]),
];

/// Checked in order; the first category with a hit wins.
const CATEGORIES: &[(&str, &[&str])] = &[
  ("Product Feature", &[
    "nueva función",
    "actualización",
    "nueva versión",
    "lanzamiento",
    "feature",
  ]),
  ("Promo & Incentives", &["promoción", "descuento", "cupón", "bono", "sorteo", "gratis"]),
  ("Commercial Terms", &["comisión", "tarifa", "precio", "ganancias", "pago"]),
  ("Safety", &["robo", "asalto", "accidente", "seguridad", "crimen"]),
  ("Regulation", &["regulación", "ley", "mtc", "atu", "multa", "permiso"]),
  ("Labor", &["paro", "huelga", "protesta", "manifestación"]),
];

pub const DEFAULT_CATEGORY: &str = "General";

const POSITIVE: &[&str] = &[
  "éxito",
  "crecimiento",
  "mejora",
  "positivo",
  "success",
  "growth",
  "lanza",
  "nueva",
];
const NEGATIVE: &[&str] = &[
  "problema",
  "queja",
  "huelga",
  "protesta",
  "issue",
  "problem",
  "strike",
  "robo",
  "asalto",
];

/// Search terms added to a competitor query for a category slug.
const CATEGORY_QUERY_TERMS: &[(&str, &[&str])] = &[
  ("product_feature", &["nueva función", "nueva opción", "actualización"]),
  ("promo_incentives", &["promoción", "descuento", "cupón"]),
  ("commercial_terms", &["comisión", "ganancias", "tarifa"]),
  ("safety", &["robos", "asaltos", "extorsión"]),
  ("regulation", &["MTC", "ATU", "regulación"]),
  ("labor", &["paro", "huelga", "protesta"]),
  ("general", &["taxi", "aplicativo", "transporte"]),
];

/// Market-wide queries run by a scan; `{year}` is substituted.
pub const MARKET_QUERIES: &[&str] = &[
  "taxi aplicativo Peru regulación ATU MTC {year}",
  "paro huelga conductores aplicativo Peru {year}",
  "Uber inDrive Didi competencia Peru {year}",
];

/// Peruvian outlets a search can be restricted to.
pub const PERU_NEWS_SOURCES: &[&str] = &[
  "apnoticias.pe",
  "agenciaperu.net",
  "elperuano.pe",
  "panamericana.pe",
  "noticiasperu.pe",
  "gacetaperutv.pe",
  "linkempresarial.pe",
  "accesoperu.com",
  "serperuano.com",
  "mercadonegro.pe",
  "revistaeconomia.com",
  "jcmagazine.com",
  "sobreruedas.news",
  "dracing.pe",
  "nteve.com",
  "comunidaria.com",
  "entrenotas20.com",
  "viajandoporperu.com",
  "radionuevaq.pe",
];

/// Sites named in one filter; longer queries get truncated by providers.
const SITE_FILTER_LIMIT: usize = 5;

/// `(site:a OR site:b ...)` over the first few non-blank `sources`, or
/// `None` when there are none.
pub fn site_filter<S: AsRef<str>>(sources: &[S]) -> Option<String> {
  let sites: Vec<String> = sources
    .iter()
    .map(|s| s.as_ref().trim())
    .filter(|s| !s.is_empty())
    .take(SITE_FILTER_LIMIT)
    .map(|s| format!("site:{s}"))
    .collect();
  (!sites.is_empty()).then(|| format!("({})", sites.join(" OR ")))
}

fn any_in(text: &str, keywords: &[&str]) -> bool {
  keywords.iter().any(|kw| text.contains(kw))
}

/// Sorted, de-duplicated slugs of the competitors named in `text`.
pub fn detect_competitors(text: &str) -> Vec<String> {
  let lower = text.to_lowercase();
  let mut found: Vec<String> = COMPETITORS
    .iter()
    .filter(|c| any_in(&lower, c.aliases))
    .map(|c| c.slug.to_owned())
    .collect();
  found.sort();
  found.dedup();
  found
}

/// Matching topics in table order, `["general"]` when none match.
pub fn detect_topics(text: &str) -> Vec<String> {
  let lower = text.to_lowercase();
  let topics: Vec<String> = TOPICS
    .iter()
    .filter(|(_, kws)| any_in(&lower, kws))
    .map(|(topic, _)| (*topic).to_owned())
    .collect();
  if topics.is_empty() { vec!["general".to_owned()] } else { topics }
}

pub fn detect_category(text: &str) -> &'static str {
  let lower = text.to_lowercase();
  CATEGORIES
    .iter()
    .find(|(_, kws)| any_in(&lower, kws))
    .map_or(DEFAULT_CATEGORY, |(category, _)| *category)
}

/// Majority of positive vs negative keyword hits; neutral on a tie.
pub fn detect_sentiment(text: &str) -> Sentiment {
  let lower = text.to_lowercase();
  let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();
  let (pos, neg) = (count(POSITIVE), count(NEGATIVE));
  match pos.cmp(&neg) {
    std::cmp::Ordering::Greater => Sentiment::Positive,
    std::cmp::Ordering::Less => Sentiment::Negative,
    std::cmp::Ordering::Equal => Sentiment::Neutral,
  }
}

pub fn competitor_by_slug(slug: &str) -> Option<&'static CompetitorAliases> {
  COMPETITORS.iter().find(|c| c.slug == slug)
}

pub fn category_query_terms(category: &str) -> Option<&'static [&'static str]> {
  CATEGORY_QUERY_TERMS
    .iter()
    .find(|(slug, _)| *slug == category)
    .map(|(_, terms)| *terms)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn site_filter_takes_first_five() {
    let filter = site_filter(PERU_NEWS_SOURCES).unwrap();
    assert_eq!(filter.matches("site:").count(), 5);
    assert!(filter.starts_with("(site:apnoticias.pe OR "));
    assert!(!filter.contains("gacetaperutv.pe"));
    assert_eq!(site_filter::<&str>(&[]), None);
  }

  #[test]
  fn competitors_are_sorted_and_unique() {
    let text = "Uber e In-Drive compiten; inDrive y UBER bajan precios";
    assert_eq!(detect_competitors(text), vec!["indrive".to_owned(), "uber".to_owned()]);
    assert!(detect_competitors("nada relevante").is_empty());
  }

  #[test]
  fn topics_default_to_general() {
    assert_eq!(detect_topics("Clima en Lima"), vec!["general".to_owned()]);
    assert_eq!(
      detect_topics("Huelga de conductores por la comisión"),
      vec!["pricing".to_owned(), "drivers".to_owned(), "labor".to_owned()]
    );
  }

  #[test]
  fn regulator_acronyms_match_lowercased_text() {
    assert!(detect_topics("La ATU fiscaliza").contains(&"regulation".to_owned()));
    assert_eq!(detect_category("El MTC anuncia multas"), "Regulation");
  }

  #[test]
  fn category_follows_table_order() {
    assert_eq!(detect_category("Nueva función y descuento"), "Product Feature");
    assert_eq!(detect_category("Descuento del 20%"), "Promo & Incentives");
    assert_eq!(detect_category("Clima soleado"), DEFAULT_CATEGORY);
  }

  #[test]
  fn sentiment_by_majority() {
    assert_eq!(detect_sentiment("Éxito y crecimiento de Yango"), Sentiment::Positive);
    assert_eq!(detect_sentiment("Huelga y protesta, otro robo"), Sentiment::Negative);
    assert_eq!(detect_sentiment("Mejora pero hay una queja"), Sentiment::Neutral);
  }

  #[test]
  fn query_terms_by_category() {
    assert_eq!(category_query_terms("labor"), Some(&["paro", "huelga", "protesta"][..]));
    assert!(category_query_terms("weather").is_none());
    assert_eq!(competitor_by_slug("indrive").map(|c| c.name), Some("inDrive"));
  }
}
