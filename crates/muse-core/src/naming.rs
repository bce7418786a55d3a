//! Canonical asset naming and versioning
//!
//! Every persisted artifact is named `{ordinal:03}_{kind}_{label}[_v{n}][.{ext}]`.
//! The three-digit zero-padded ordinal keeps directory listings sort-stable
//! across batches of up to 999 assets, and the normalized label guarantees
//! filenames stay within `[a-z0-9_]`.

/// Normalize a free-form label into a filename-safe slug.
///
/// Lower-cases, maps spaces and hyphens to underscores, strips everything
/// outside `[a-z0-9_]`, collapses repeated underscores, and trims leading
/// and trailing underscores.
pub fn slugify(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        let c = c.to_ascii_lowercase();
        let mapped = match c {
            ' ' | '-' => Some('_'),
            'a'..='z' | '0'..='9' | '_' => Some(c),
            _ => None,
        };
        if let Some(m) = mapped {
            if m == '_' && out.ends_with('_') {
                continue;
            }
            out.push(m);
        }
    }
    out.trim_matches('_').to_string()
}

/// Build the canonical filename for an asset.
pub fn make_name(
    ordinal: u32,
    kind: &str,
    label: &str,
    version: Option<u32>,
    ext: Option<&str>,
) -> String {
    let mut name = format!("{:03}_{}_{}", ordinal, kind, slugify(label));
    if let Some(v) = version {
        name.push_str(&format!("_v{}", v));
    }
    if let Some(e) = ext {
        name.push('.');
        name.push_str(e);
    }
    name
}

/// Extract the leading ordinal from a compound asset id like `"4.2"`.
///
/// Returns 0 for any malformed id. Callers must treat 0 as "unclassified",
/// never as an error.
pub fn extract_ordinal(asset_id: &str) -> u32 {
    asset_id
        .split('.')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Lower Third - Main Title"), "lower_third_main_title");
        assert_eq!(slugify("  Already_clean  "), "already_clean");
        assert_eq!(slugify("Café & Bar!"), "caf_bar");
        assert_eq!(slugify("___"), "");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("a -- b"), "a_b");
        assert_eq!(slugify("a___b"), "a_b");
    }

    #[test]
    fn test_make_name_full() {
        assert_eq!(
            make_name(4, "image", "Hero Banner", Some(2), Some("png")),
            "004_image_hero_banner_v2.png"
        );
    }

    #[test]
    fn test_make_name_minimal() {
        assert_eq!(make_name(12, "audio", "sting", None, None), "012_audio_sting");
    }

    #[test]
    fn test_make_name_large_ordinal() {
        assert_eq!(
            make_name(1042, "video", "intro", None, Some("mp4")),
            "1042_video_intro.mp4"
        );
    }

    #[test]
    fn test_extract_ordinal() {
        assert_eq!(extract_ordinal("4.2"), 4);
        assert_eq!(extract_ordinal("17.0"), 17);
        assert_eq!(extract_ordinal("garbage"), 0);
        assert_eq!(extract_ordinal(""), 0);
        assert_eq!(extract_ordinal(".5"), 0);
        assert_eq!(extract_ordinal("-3.1"), 0);
    }

    proptest! {
        #[test]
        fn slug_charset_is_clean(label in ".*") {
            let slug = slugify(&label);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || c == '_'));
            prop_assert!(!slug.starts_with('_'));
            prop_assert!(!slug.ends_with('_'));
            prop_assert!(!slug.contains("__"));
        }

        #[test]
        fn make_name_deterministic(
            ordinal in 0u32..2000,
            label in "[a-zA-Z0-9 _-]{0,32}",
            version in proptest::option::of(0u32..100),
        ) {
            let a = make_name(ordinal, "image", &label, version, Some("png"));
            let b = make_name(ordinal, "image", &label, version, Some("png"));
            prop_assert_eq!(a, b);
        }

        #[test]
        fn make_name_embeds_ordinal_and_version(
            ordinal in 0u32..999,
            version in 1u32..50,
        ) {
            let name = make_name(ordinal, "model", "prop", Some(version), None);
            let prefix = format!("{:03}_", ordinal);
            let suffix = format!("_v{}", version);
            prop_assert!(name.starts_with(&prefix), "missing ordinal prefix in {:?}", name);
            prop_assert!(name.ends_with(&suffix), "missing version suffix in {:?}", name);
        }

        #[test]
        fn extract_ordinal_roundtrip(ordinal in 0u32..100_000, sub in 0u32..100) {
            let id = format!("{}.{}", ordinal, sub);
            prop_assert_eq!(extract_ordinal(&id), ordinal);
        }

        #[test]
        fn extract_ordinal_never_panics(id in ".*") {
            let _ = extract_ordinal(&id);
        }
    }
}
