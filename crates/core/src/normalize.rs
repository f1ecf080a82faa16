//! Text normalization shared by title and location matching
//!
//! Calendar summaries, content titles and venue names are compared through
//! the same folding so that the three inputs can never drift apart.

/// Fold a string into its comparison form: lowercase, `&amp;`/`&` spelled
/// out as "and", every run of non-alphanumeric characters collapsed to a
/// single space, surrounding whitespace trimmed.
pub fn normalize(value: &str) -> String {
    let replaced = value.trim().to_lowercase().replace("&amp;", "&").replace('&', " and ");

    let mut out = String::with_capacity(replaced.len());
    let mut pending_space = false;
    for ch in replaced.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Derive a URL-safe slug: the normalized form with hyphens for spaces.
pub fn slugify(value: &str) -> String {
    normalize(value).replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_punctuation_runs() {
        assert_eq!(normalize("  Game Night -- Vol. 3!  "), "game night vol 3");
    }

    #[test]
    fn test_normalize_spells_out_ampersand() {
        assert_eq!(normalize("Board &amp; Dice"), "board and dice");
        assert_eq!(normalize("Board & Dice"), "board and dice");
    }

    #[test]
    fn test_normalize_drops_non_ascii() {
        // Accented characters act as separators, consistently on both the
        // directory side and the feed side
        assert_eq!(normalize("Café Azul"), "caf azul");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Game Night: Vol. 3"), "game-night-vol-3");
        assert_eq!(slugify(""), "");
    }
}
