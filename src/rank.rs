use crate::seller::{Price, Seller};
use std::cmp::Ordering;

/// Maximum rows shown for ranked listings.
const LIST_LIMIT: usize = 5;
/// Maximum rows shown for a category match.
const CATEGORY_LIMIT: usize = 3;
/// Maximum sellers in a side-by-side comparison.
pub const COMPARE_LIMIT: usize = 3;

/// Top sellers by rating, best first. Unrated sellers count as 0.
pub fn top_rated(sellers: &[Seller]) -> Vec<Seller> {
    let mut ranked = sellers.to_vec();
    ranked.sort_by(|a, b| {
        b.effective_rating()
            .partial_cmp(&a.effective_rating())
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(LIST_LIMIT);
    ranked
}

/// Sellers by price, cheapest first. Missing or non-numeric prices
/// count as 0.
pub fn cheapest(sellers: &[Seller]) -> Vec<Seller> {
    let mut ranked = sellers.to_vec();
    ranked.sort_by(|a, b| {
        a.effective_price()
            .partial_cmp(&b.effective_price())
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(LIST_LIMIT);
    ranked
}

/// Sellers in a category (case-insensitive exact match), top 3 by rating.
pub fn by_category(sellers: &[Seller], category: &str) -> Vec<Seller> {
    let mut matched: Vec<Seller> = sellers
        .iter()
        .filter(|s| s.category.eq_ignore_ascii_case(category))
        .cloned()
        .collect();
    matched.sort_by(|a, b| {
        b.effective_rating()
            .partial_cmp(&a.effective_rating())
            .unwrap_or(Ordering::Equal)
    });
    matched.truncate(CATEGORY_LIMIT);
    matched
}

/// Sellers whose city contains the query, grouped by category in
/// first-appearance order.
pub fn by_location(sellers: &[Seller], query: &str) -> Vec<(String, Vec<Seller>)> {
    let query = query.to_lowercase();
    let mut groups: Vec<(String, Vec<Seller>)> = Vec::new();

    for seller in sellers {
        if !seller.city.to_lowercase().contains(&query) {
            continue;
        }
        match groups
            .iter_mut()
            .find(|(cat, _)| cat.eq_ignore_ascii_case(&seller.category))
        {
            Some((_, group)) => group.push(seller.clone()),
            None => groups.push((seller.category.clone(), vec![seller.clone()])),
        }
    }

    groups
}

/// Sellers whose name contains the query, case-insensitive.
pub fn by_name(sellers: &[Seller], query: &str) -> Vec<Seller> {
    let query = query.to_lowercase();
    sellers
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

pub fn display_rating(seller: &Seller) -> String {
    match seller.rating {
        Some(r) => format!("{:.1}★", r),
        None => "New".to_string(),
    }
}

pub fn display_price(seller: &Seller) -> String {
    match &seller.price {
        Some(Price::Number(n)) => format!("${}", n),
        Some(Price::Text(s)) => s.clone(),
        None => "Varies".to_string(),
    }
}

/// One-line listing entry, used in ranked result lists.
pub fn summary_line(seller: &Seller) -> String {
    format!(
        "{} — {} ({}, {})",
        seller.name,
        seller.category,
        display_rating(seller),
        display_price(seller)
    )
}

/// Full detail block for one seller, also the unit of comparison output.
pub fn seller_card(seller: &Seller) -> String {
    format!(
        "{}\n  Category: {}\n  Rating: {}\n  Location: {}, {}\n  Price: {}\n  Service: {}",
        seller.name,
        seller.category,
        display_rating(seller),
        seller.address,
        seller.city,
        display_price(seller),
        seller.service
    )
}

/// Side-by-side comparison for 2-3 sellers. Refuses anything smaller.
pub fn render_comparison(sellers: &[Seller]) -> String {
    if sellers.len() < 2 {
        return "I need at least 2 sellers to compare. Tell me two or three names, like \
                \"John's Plumbing and Acme Electric\"."
            .to_string();
    }

    sellers
        .iter()
        .take(COMPARE_LIMIT)
        .map(seller_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller(name: &str, category: &str, rating: Option<f64>, price: Option<Price>) -> Seller {
        Seller {
            id: name.to_lowercase(),
            name: name.to_string(),
            category: category.to_string(),
            city: "Boston".to_string(),
            address: "1 Main St".to_string(),
            service: "General work".to_string(),
            rating,
            price,
        }
    }

    #[test]
    fn top_rated_sorts_descending_and_truncates() {
        let sellers: Vec<Seller> = (0..8)
            .map(|i| seller(&format!("S{}", i), "Plumbing", Some(i as f64 * 0.5), None))
            .collect();

        let ranked = top_rated(&sellers);
        assert_eq!(ranked.len(), 5);
        for pair in ranked.windows(2) {
            assert!(pair[0].effective_rating() >= pair[1].effective_rating());
        }
    }

    #[test]
    fn top_rated_treats_missing_rating_as_zero() {
        let sellers = vec![
            seller("Unrated", "Plumbing", None, None),
            seller("Rated", "Plumbing", Some(3.0), None),
        ];
        let ranked = top_rated(&sellers);
        assert_eq!(ranked[0].name, "Rated");
        assert_eq!(ranked[1].name, "Unrated");
    }

    #[test]
    fn cheapest_sorts_ascending_with_text_prices() {
        let sellers = vec![
            seller("Pricey", "Plumbing", None, Some(Price::Number(300.0))),
            seller("Vague", "Plumbing", None, Some(Price::Text("call us".into()))),
            seller("Steep", "Plumbing", None, Some(Price::Text("from $95".into()))),
            seller("Fair", "Plumbing", None, Some(Price::Text("$50/hr".into()))),
        ];
        let ranked = cheapest(&sellers);
        let prices: Vec<f64> = ranked.iter().map(|s| s.effective_price()).collect();
        assert_eq!(prices, vec![0.0, 50.0, 95.0, 300.0]);
        assert!(ranked.len() <= 5);
    }

    #[test]
    fn by_category_is_exact_and_top_three() {
        let mut sellers: Vec<Seller> = (0..5)
            .map(|i| seller(&format!("P{}", i), "Plumbing", Some(i as f64), None))
            .collect();
        sellers.push(seller("Sparky", "Electrician", Some(5.0), None));

        let matched = by_category(&sellers, "plumbing");
        assert_eq!(matched.len(), 3);
        assert!(matched.iter().all(|s| s.category == "Plumbing"));
        assert_eq!(matched[0].name, "P4");
    }

    #[test]
    fn by_location_groups_by_category() {
        let mut a = seller("A", "Plumbing", None, None);
        a.city = "Boston".into();
        let mut b = seller("B", "Electrician", None, None);
        b.city = "South Boston".into();
        let mut c = seller("C", "Plumbing", None, None);
        c.city = "Boston".into();
        let mut d = seller("D", "Plumbing", None, None);
        d.city = "Salem".into();

        let groups = by_location(&[a, b, c, d], "boston");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Plumbing");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "Electrician");
    }

    #[test]
    fn by_name_is_case_insensitive_substring() {
        let sellers = vec![
            seller("John Smith", "Electrician", None, None),
            seller("Jane", "Plumbing", None, None),
        ];
        let matched = by_name(&sellers, "john");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "John Smith");
    }

    #[test]
    fn comparison_refuses_fewer_than_two() {
        let one = vec![seller("A", "Plumbing", None, None)];
        assert!(render_comparison(&[]).contains("at least 2"));
        assert!(render_comparison(&one).contains("at least 2"));
        assert!(!render_comparison(&one).contains("Category:"));
    }

    #[test]
    fn comparison_shows_new_and_varies_for_missing_fields() {
        let pair = vec![
            seller("A", "Plumbing", None, None),
            seller("B", "Plumbing", Some(4.0), Some(Price::Number(99.0))),
        ];
        let rendered = render_comparison(&pair);
        assert!(rendered.contains("Rating: New"));
        assert!(rendered.contains("Price: Varies"));
        assert!(rendered.contains("Rating: 4.0★"));
        assert!(rendered.contains("Price: $99"));
    }

    #[test]
    fn comparison_caps_at_three_blocks() {
        let many: Vec<Seller> = (0..5)
            .map(|i| seller(&format!("S{}", i), "Plumbing", None, None))
            .collect();
        let rendered = render_comparison(&many);
        assert_eq!(rendered.matches("Category:").count(), 3);
    }
}
