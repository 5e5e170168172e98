use mongodb::bson::oid::ObjectId;

use crate::database::StoreRepository;
use crate::utils::AppResult;

/// Used when a name has no sluggable characters at all (e.g. "!!!")
const FALLBACK_SLUG: &str = "store";

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        '&' => "and",
        _ => return None,
    };
    Some(folded)
}

/// URL-safe form of a display name: lowercase ASCII words joined by `-`.
///
/// Apostrophes are dropped so "Kelly's Deli" becomes `kellys-deli`; common
/// Latin accents are folded to their base letter.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut needs_dash = false;

    for c in name.chars() {
        if c == '\'' || c == '’' {
            continue;
        }

        let word = if c.is_ascii_alphanumeric() {
            None
        } else {
            match fold_char(c) {
                Some(folded) => Some(folded),
                None => {
                    needs_dash = true;
                    continue;
                }
            }
        };

        if needs_dash && !slug.is_empty() {
            slug.push('-');
        }
        needs_dash = false;

        match word {
            Some(folded) => slug.push_str(folded),
            None => slug.push(c.to_ascii_lowercase()),
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Regex matching `base` itself or `base` followed by `-<digits>`
pub fn collision_pattern(base: &str) -> String {
    format!("^({})((-[0-9]*$)?)$", regex::escape(base))
}

/// `base` when nothing collides, otherwise `base-(n+1)` for n collisions
pub fn disambiguate(base: &str, collisions: u64) -> String {
    if collisions == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, collisions + 1)
    }
}

/// Computes the slug a store named `name` should be saved with.
///
/// Count-then-set is not atomic: two concurrent saves of the same name can
/// both observe the same count and end up with the same slug.
pub async fn assign_slug(
    stores: &dyn StoreRepository,
    name: &str,
    exclude: Option<ObjectId>,
) -> AppResult<String> {
    let base = slugify(name);
    let collisions = stores.count_slug_collisions(&base, exclude).await?;
    let slug = disambiguate(&base, collisions);

    log::debug!("🔗 Slug for '{}': {} ({} collisions)", name, slug, collisions);

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Wes's Coffee Shop"), "wess-coffee-shop");
        assert_eq!(slugify("  Café  Crème!! "), "cafe-creme");
        assert_eq!(slugify("Fish & Chips"), "fish-and-chips");
        assert_eq!(slugify("Bar--None"), "bar-none");
        assert_eq!(slugify("Store 24/7"), "store-24-7");
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
    }

    #[test]
    fn test_disambiguate_sequence() {
        let slugs: Vec<String> = (0..4).map(|n| disambiguate("deli", n)).collect();
        assert_eq!(slugs, vec!["deli", "deli-2", "deli-3", "deli-4"]);
    }

    #[test]
    fn test_collision_pattern() {
        let re = RegexBuilder::new(&collision_pattern("deli"))
            .case_insensitive(true)
            .build()
            .unwrap();

        assert!(re.is_match("deli"));
        assert!(re.is_match("DELI"));
        assert!(re.is_match("deli-2"));
        assert!(re.is_match("deli-10"));
        assert!(!re.is_match("deli-shop"));
        assert!(!re.is_match("the-deli"));
        assert!(!re.is_match("delis"));
    }

    #[test]
    fn test_collision_pattern_escapes_base() {
        let re = regex::Regex::new(&collision_pattern("a.b")).unwrap();
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));
    }
}
