//! Pattern-based intent detection for the assistant.
//!
//! Candidate rules are tried in a fixed priority order against normalized
//! (lower-cased, trimmed) input; the first matching rule wins. No scoring,
//! no ambiguity resolution.

use regex::Regex;
use std::sync::LazyLock;

/// What the user asked for, in rule priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Greeting,
    /// "what services do you offer"
    ListServices,
    /// "show me the categories"
    ListCategories,
    /// "compare two sellers"
    Compare,
    /// "who's the best rated"
    TopRated,
    /// "cheapest option", "how much does it cost"
    PriceQuery,
    /// Input mentions a known category by name.
    Category(String),
    /// "anyone near me"
    Location,
    /// "find <name>"; None when no name was given.
    SellerSearch(Option<String>),
    Help,
    Thanks,
    Goodbye,
    Fallback,
}

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(hi|hello|hey|heya|howdy|yo|good (morning|afternoon|evening))\b").unwrap()
});

static LIST_SERVICES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(what|which|list|show)\b.*\bservices?\b|\bservices?\b.*\b(offer|available|provide)\b")
        .unwrap()
});

static LIST_CATEGORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcategor(y|ies)\b|\btypes? of services?\b|\bwhat can i book\b").unwrap()
});

static COMPARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(compare|versus|vs|side by side)\b").unwrap());

static TOP_RATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(top rated|top-rated|top|best|highest rated|most popular)\b").unwrap()
});

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(cheap(est)?|price|prices|pricing|cost|costs|affordable|budget)\b").unwrap()
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(near me|nearby|near|in my (area|city)|around here|close by|location)\b")
        .unwrap()
});

static SELLER_SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:find|search for|search|look(?:ing)? for|show me|who is)\b\s*(.*)").unwrap()
});

static HELP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bhelp\b|\bassist\b|\bwhat can you do\b|\bhow does this work\b").unwrap()
});

static THANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(thanks|thank you|thx|appreciate)\b").unwrap());

static GOODBYE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(bye|goodbye|see you|good night|farewell)\b").unwrap());

/// Detect the intent of normalized input. `categories` is the snapshot's
/// category list, used for the category-name substring rule.
pub fn detect(text: &str, categories: &[String]) -> Intent {
    if text.is_empty() {
        return Intent::Fallback;
    }

    if GREETING.is_match(text) {
        return Intent::Greeting;
    }
    if LIST_SERVICES.is_match(text) {
        return Intent::ListServices;
    }
    if LIST_CATEGORIES.is_match(text) {
        return Intent::ListCategories;
    }
    if COMPARE.is_match(text) {
        return Intent::Compare;
    }
    if TOP_RATED.is_match(text) {
        return Intent::TopRated;
    }
    if PRICE.is_match(text) {
        return Intent::PriceQuery;
    }
    if let Some(category) = categories
        .iter()
        .find(|c| text.contains(&c.to_lowercase()))
    {
        return Intent::Category(category.clone());
    }
    if LOCATION.is_match(text) {
        return Intent::Location;
    }
    if let Some(caps) = SELLER_SEARCH.captures(text) {
        return Intent::SellerSearch(clean_search_term(&caps[1]));
    }
    if HELP.is_match(text) {
        return Intent::Help;
    }
    if THANKS.is_match(text) {
        return Intent::Thanks;
    }
    if GOODBYE.is_match(text) {
        return Intent::Goodbye;
    }

    Intent::Fallback
}

/// Strip filler words from a captured search term; "find a seller" carries
/// no actual name.
fn clean_search_term(term: &str) -> Option<String> {
    let cleaned: Vec<&str> = term
        .split_whitespace()
        .filter(|w| {
            !matches!(
                *w,
                "a" | "an" | "the" | "for" | "me" | "please" | "seller" | "sellers" | "someone"
            )
        })
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(" "))
    }
}
