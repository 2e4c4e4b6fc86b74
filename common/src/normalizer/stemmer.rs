//! 単数形・複数形の簡易ステマー
//!
//! 規則は優先順に評価し、最初に一致したものを採用する:
//! 1. 不規則複数形テーブル
//! 2. `-ies` → `-y`
//! 3. `-(ss|x|z|ch|sh)es` → `-es` を除去
//! 4. `-ves` → `-f`（`-fe` 形は扱わない）
//! 5. `-s` を除去（4文字以上、`-ss`/`-us`/`-is` は除く）

/// 不規則複数形（単数形, 複数形）
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("child", "children"),
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("calf", "calves"),
    ("shelf", "shelves"),
    ("wolf", "wolves"),
    ("thief", "thieves"),
    ("loaf", "loaves"),
    ("deer", "deer"),
    ("sheep", "sheep"),
    ("fish", "fish"),
    ("species", "species"),
    ("series", "series"),
];

/// 不規則複数形テーブルを引き、単数形を返す
pub fn irregular_singular(word: &str) -> Option<&'static str> {
    IRREGULAR_PLURALS
        .iter()
        .find(|(singular, plural)| *singular == word || *plural == word)
        .map(|(singular, _)| *singular)
}

/// 単語を語幹（単数形）に変換
///
/// 入力は小文字化済みであること。
pub fn stem(word: &str) -> String {
    if let Some(singular) = irregular_singular(word) {
        return singular.to_string();
    }

    // -ies -> -y (babies -> baby)
    if let Some(base) = word.strip_suffix("ies") {
        if base.chars().count() > 1 {
            return format!("{}y", base);
        }
    }

    // -es after ss, x, z, ch, sh (boxes -> box, churches -> church)
    if let Some(base) = word.strip_suffix("es") {
        let sibilant = ["ss", "x", "z", "ch", "sh"]
            .iter()
            .any(|ending| base.len() > ending.len() && base.ends_with(ending));
        if sibilant {
            return base.to_string();
        }
    }

    // -ves -> -f (wolves -> wolf)
    if let Some(base) = word.strip_suffix("ves") {
        if base.chars().count() > 1 {
            return format!("{}f", base);
        }
    }

    // 単純な -s (cats -> cat)
    if word.chars().count() >= 4
        && word.ends_with('s')
        && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is"))
    {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_regular_plurals() {
        assert_eq!(stem("boxes"), "box");
        assert_eq!(stem("churches"), "church");
        assert_eq!(stem("classes"), "class");
        assert_eq!(stem("babies"), "baby");
        assert_eq!(stem("berries"), "berry");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("spiders"), "spider");
    }

    #[test]
    fn test_stem_ves() {
        assert_eq!(stem("wolves"), "wolf");
        assert_eq!(stem("hooves"), "hoof");
    }

    #[test]
    fn test_stem_irregular() {
        assert_eq!(stem("children"), "child");
        assert_eq!(stem("child"), "child");
        assert_eq!(stem("mice"), "mouse");
        assert_eq!(stem("geese"), "goose");
        assert_eq!(stem("knives"), "knife");
        assert_eq!(stem("leaves"), "leaf");
    }

    #[test]
    fn test_stem_unchanged() {
        // テーブルに登録された同形複数
        assert_eq!(stem("species"), "species");
        assert_eq!(stem("series"), "series");
        assert_eq!(stem("deer"), "deer");
        // -ss / -us / -is は除外
        assert_eq!(stem("moss"), "moss");
        assert_eq!(stem("cactus"), "cactus");
        assert_eq!(stem("iris"), "iris");
        // 3文字以下は -s を残す
        assert_eq!(stem("gas"), "gas");
        assert_eq!(stem("nest"), "nest");
    }

    #[test]
    fn test_stem_short_ies_stem() {
        // -ies の語幹が1文字なら規則2は適用しない
        assert_eq!(stem("ties"), "tie");
        assert_eq!(stem("dies"), "die");
    }

    #[test]
    fn test_stem_is_stable() {
        for word in ["boxes", "babies", "wolves", "cats", "children", "classes", "stories"] {
            let once = stem(word);
            assert_eq!(stem(&once), once, "二重適用で変化: {}", word);
        }
    }
}
