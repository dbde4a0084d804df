use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Price as stored in seller documents: some sellers quote a number,
/// others free text like "from $40" or "negotiable".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Seller {
    pub id: String,
    pub name: String,
    pub category: String,
    pub city: String,
    pub address: String,
    pub service: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price: Option<Price>,
}

impl Seller {
    /// Rating used for ordering. Unrated sellers sort as 0.
    pub fn effective_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// Price used for ordering. Text prices keep their leading numeric
    /// part ("250/hr" -> 250); anything else is 0.
    pub fn effective_price(&self) -> f64 {
        match &self.price {
            Some(Price::Number(n)) => *n,
            Some(Price::Text(s)) => leading_number(s),
            None => 0.0,
        }
    }
}

fn leading_number(s: &str) -> f64 {
    // Skip any prefix words ("from $40") to the first digit
    let start = match s.find(|c: char| c.is_ascii_digit()) {
        Some(i) => i,
        None => return 0.0,
    };
    let rest = &s[start..];
    let end = rest
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*c == '.' && *i > 0))
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    rest[..end].parse().unwrap_or(0.0)
}

/// Session-scoped snapshot of the seller directory. Loaded once when the
/// assistant opens and read-only after that.
pub struct SellerDirectory {
    sellers: Vec<Seller>,
    categories: Vec<String>,
}

impl SellerDirectory {
    pub fn new() -> Self {
        Self {
            sellers: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn from_sellers(sellers: Vec<Seller>) -> Self {
        let mut dir = Self {
            sellers,
            categories: Vec::new(),
        };
        dir.build_index();
        dir
    }

    pub async fn load_from_json(&mut self, path: &str) -> Result<()> {
        let content = tokio::fs::read_to_string(path).await?;
        self.sellers = serde_json::from_str(&content)?;
        self.build_index();
        Ok(())
    }

    fn build_index(&mut self) {
        // Collect categories in first-appearance order, no duplicates
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();

        for seller in &self.sellers {
            if seen.insert(seller.category.to_lowercase()) {
                ordered.push(seller.category.clone());
            }
        }

        self.categories = ordered;
    }

    pub fn sellers(&self) -> &[Seller] {
        &self.sellers
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.sellers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }

    /// Distinct cities in first-appearance order (quick-reply chips).
    pub fn cities(&self) -> Vec<String> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        for seller in &self.sellers {
            if seen.insert(seller.city.to_lowercase()) {
                ordered.push(seller.city.clone());
            }
        }
        ordered
    }

    /// Resolve free text to a known category: either side may contain
    /// the other ("plumb" -> "Plumbing", "plumbing services" -> "Plumbing").
    pub fn resolve_category(&self, query: &str) -> Option<&String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.categories.iter().find(|c| {
            let c = c.to_lowercase();
            c.contains(&query) || query.contains(&c)
        })
    }
}

impl Default for SellerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn seller(name: &str, category: &str) -> Seller {
        Seller {
            id: name.to_lowercase(),
            name: name.to_string(),
            category: category.to_string(),
            city: "Springfield".to_string(),
            address: "1 Main St".to_string(),
            service: "General work".to_string(),
            rating: None,
            price: None,
        }
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let dir = SellerDirectory::from_sellers(vec![
            seller("A", "Plumbing"),
            seller("B", "Electrician"),
            seller("C", "plumbing"),
        ]);
        assert_eq!(dir.categories(), &["Plumbing", "Electrician"]);
    }

    #[test]
    fn resolve_category_matches_both_directions() {
        let dir = SellerDirectory::from_sellers(vec![seller("A", "Plumbing")]);
        assert_eq!(dir.resolve_category("plumb"), Some(&"Plumbing".to_string()));
        assert_eq!(
            dir.resolve_category("plumbing services"),
            Some(&"Plumbing".to_string())
        );
        assert_eq!(dir.resolve_category("roofing"), None);
        assert_eq!(dir.resolve_category("  "), None);
    }

    #[test]
    fn effective_price_handles_text_and_missing() {
        let mut s = seller("A", "Plumbing");
        assert_eq!(s.effective_price(), 0.0);

        s.price = Some(Price::Number(120.0));
        assert_eq!(s.effective_price(), 120.0);

        s.price = Some(Price::Text("$45.50/hr".to_string()));
        assert_eq!(s.effective_price(), 45.5);

        s.price = Some(Price::Text("from $40".to_string()));
        assert_eq!(s.effective_price(), 40.0);

        s.price = Some(Price::Text("negotiable".to_string()));
        assert_eq!(s.effective_price(), 0.0);
    }

    #[tokio::test]
    async fn load_from_json_accepts_mixed_price_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id":"1","name":"John Smith","category":"Electrician","city":"Boston",
                  "address":"2 Elm St","service":"Wiring","rating":4.5,"price":80}},
                {{"id":"2","name":"Jane","category":"Plumbing","city":"Salem",
                  "address":"3 Oak St","service":"Pipes","price":"from $40"}}
            ]"#
        )
        .unwrap();

        let mut dir = SellerDirectory::new();
        dir.load_from_json(file.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.sellers()[0].effective_price(), 80.0);
        assert_eq!(dir.sellers()[1].effective_price(), 40.0);
        assert!(dir.sellers()[1].rating.is_none());
    }
}
