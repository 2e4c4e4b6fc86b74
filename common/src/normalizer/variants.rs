//! 米英綴り（US/British）の対応表

/// 米綴り → 英綴り
const SPELLING_VARIANTS: &[(&str, &str)] = &[
    ("color", "colour"),
    ("gray", "grey"),
    ("center", "centre"),
    ("meter", "metre"),
    ("fiber", "fibre"),
    ("theater", "theatre"),
    ("organize", "organise"),
    ("recognize", "recognise"),
    ("realize", "realise"),
    ("analyze", "analyse"),
    ("paralyze", "paralyse"),
    ("catalog", "catalogue"),
    ("dialog", "dialogue"),
    ("traveler", "traveller"),
    ("canceled", "cancelled"),
    ("labeled", "labelled"),
    ("modeling", "modelling"),
    ("flavor", "flavour"),
    ("honor", "honour"),
    ("labor", "labour"),
    ("neighbor", "neighbour"),
    ("vigor", "vigour"),
    ("defense", "defence"),
    ("offense", "offence"),
    ("license", "licence"),
    ("practice", "practise"),
    ("aging", "ageing"),
    ("jewelry", "jewellery"),
    ("tire", "tyre"),
    ("plow", "plough"),
];

/// 単語の綴り違いを返す（双方向）
pub fn spelling_variants(word: &str) -> Vec<&'static str> {
    let mut variants = Vec::new();

    for (us, british) in SPELLING_VARIANTS {
        if *us == word {
            variants.push(*british);
        }
        if *british == word {
            variants.push(*us);
        }
    }

    variants
}
