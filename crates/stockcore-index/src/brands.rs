//! Static brand-alias dictionary. Bridges colloquial shop-floor queries
//! ("omo", "mchuzi mix") to full product names.

#[derive(Debug, Clone, Copy)]
pub struct BrandAlias {
    pub canonical: &'static str,
    pub variants: &'static [&'static str],
}

impl BrandAlias {
    /// Canonical form first, then the variants. All are already normalized.
    pub fn forms(&self) -> impl Iterator<Item = &'static str> {
        let variants: &'static [&'static str] = self.variants;
        std::iter::once(self.canonical).chain(variants.iter().copied())
    }

    pub fn found_in(&self, normalized: &str) -> bool {
        !normalized.is_empty() && self.forms().any(|form| normalized.contains(form))
    }
}

pub static BRAND_ALIASES: &[BrandAlias] = &[
    BrandAlias {
        canonical: "kabras",
        variants: &["kabras sugar"],
    },
    BrandAlias {
        canonical: "mumias",
        variants: &["mumias sugar"],
    },
    BrandAlias {
        canonical: "omo",
        variants: &["omo detergent", "omo washing powder"],
    },
    BrandAlias {
        canonical: "ariel",
        variants: &["ariel detergent"],
    },
    BrandAlias {
        canonical: "sunlight",
        variants: &["sunlight detergent", "sunlight soap"],
    },
    BrandAlias {
        canonical: "royco",
        variants: &["mchuzi mix", "royco cubes"],
    },
    BrandAlias {
        canonical: "blue band",
        variants: &["blueband"],
    },
    BrandAlias {
        canonical: "kimbo",
        variants: &["kimbo fat"],
    },
    BrandAlias {
        canonical: "elianto",
        variants: &["elianto oil"],
    },
    BrandAlias {
        canonical: "golden fry",
        variants: &["goldenfry"],
    },
    BrandAlias {
        canonical: "jogoo",
        variants: &["jogoo maize meal", "jogoo unga"],
    },
    BrandAlias {
        canonical: "pembe",
        variants: &["pembe maize flour", "pembe unga"],
    },
    BrandAlias {
        canonical: "soko",
        variants: &["soko ugali"],
    },
    BrandAlias {
        canonical: "brookside",
        variants: &["brookside milk"],
    },
    BrandAlias {
        canonical: "tuzo",
        variants: &["tuzo milk"],
    },
    BrandAlias {
        canonical: "ketepa",
        variants: &["ketepa pride"],
    },
    BrandAlias {
        canonical: "kericho gold",
        variants: &["kericho tea"],
    },
    BrandAlias {
        canonical: "nescafe",
        variants: &["nescafe classic"],
    },
    BrandAlias {
        canonical: "colgate",
        variants: &["colgate toothpaste"],
    },
    BrandAlias {
        canonical: "close up",
        variants: &["closeup"],
    },
    BrandAlias {
        canonical: "geisha",
        variants: &["geisha soap"],
    },
    BrandAlias {
        canonical: "menengai",
        variants: &["menengai soap", "bar soap"],
    },
    BrandAlias {
        canonical: "coca cola",
        variants: &["coke", "cocacola"],
    },
    BrandAlias {
        canonical: "dettol",
        variants: &["dettol soap", "antiseptic"],
    },
    BrandAlias {
        canonical: "indomie",
        variants: &["noodles", "instant noodles"],
    },
    BrandAlias {
        canonical: "jik",
        variants: &["jik bleach", "bleach"],
    },
];

/// Canonical keys of every alias whose canonical form or a variant occurs as
/// a substring of `normalized`, in dictionary order.
pub fn brands_in(normalized: &str) -> Vec<&'static str> {
    BRAND_ALIASES
        .iter()
        .filter(|alias| alias.found_in(normalized))
        .map(|alias| alias.canonical)
        .collect()
}
