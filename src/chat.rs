//! Conversation engine: context handling first, then intent dispatch.
//!
//! A single optional context slot redirects the next user message to a
//! specialized handler before general intent matching runs. The slot is
//! consumed exactly once per message, even when the handler finds nothing;
//! whatever context the produced reply carries becomes the new slot value
//! (last write wins, no warning on overwrite).

use crate::intent::{self, Intent};
use crate::rank;
use crate::seller::{Seller, SellerDirectory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pending expectation for the next user message.
#[derive(Debug, Clone)]
pub enum Context {
    /// Next message names (or confirms) a category. The payload is a
    /// suggested category when the bot asked "did you mean ...?".
    AwaitingCategoryConfirmation(Option<String>),
    /// Next message picks a seller by name from the carried list.
    AwaitingSellerSelection(Vec<Seller>),
    /// Next message is a city or neighborhood.
    AwaitingLocationInput,
    /// Next message names 2-3 sellers to compare, resolved against the
    /// carried list.
    AwaitingCompareSelection(Vec<Seller>),
}

/// One bot response: text, suggested quick-reply chips, and the context
/// the response leaves behind.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub context: Option<Context>,
}

impl Reply {
    fn plain(text: impl Into<String>, quick_replies: &[&str]) -> Self {
        Self {
            text: text.into(),
            quick_replies: quick_replies.iter().map(|s| s.to_string()).collect(),
            context: None,
        }
    }

    fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One turn in the transcript. Append-only.
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub quick_replies: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            quick_replies: Vec::new(),
        }
    }

    pub fn bot(reply: &Reply) -> Self {
        Self {
            text: reply.text.clone(),
            sender: Sender::Bot,
            quick_replies: reply.quick_replies.clone(),
        }
    }
}

const FALLBACK_HINTS: &[&str] = &[
    "Try \"show me the categories\".",
    "You can ask for the top rated sellers.",
    "Ask about prices, like \"cheapest electrician\".",
    "Say \"find <name>\" to look up a seller by name.",
];

const RECOVERY_CHIPS: &[&str] = &["Show categories", "Top rated sellers", "Help"];

pub struct ChatEngine {
    directory: SellerDirectory,
    context: Option<Context>,
    rng: StdRng,
}

impl ChatEngine {
    pub fn new(directory: SellerDirectory) -> Self {
        Self {
            directory,
            context: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic engine for tests: pins the fallback hint choice and
    /// the typing delay.
    pub fn with_seed(directory: SellerDirectory, seed: u64) -> Self {
        Self {
            directory,
            context: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulated typing pause before a reply is shown, in milliseconds.
    pub fn typing_delay_ms(&mut self) -> u64 {
        self.rng.gen_range(800..=1500)
    }

    pub fn directory(&self) -> &SellerDirectory {
        &self.directory
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Opening message when the chat panel appears.
    pub fn opening(&self) -> Reply {
        Reply::plain(
            format!(
                "Hi! I'm Nest, the TaskNest assistant. We have {} sellers across {} \
                 categories. What are you looking for?",
                self.directory.len(),
                self.directory.categories().len()
            ),
            RECOVERY_CHIPS,
        )
    }

    /// Shown instead of the opening when the snapshot could not be loaded.
    pub fn offline_opening(&self) -> Reply {
        Reply::plain(
            "Sorry, I couldn't reach the seller directory right now. I can still chat, \
             but listings will come up empty.",
            &["Help"],
        )
    }

    /// Handle one user message and produce the bot reply.
    pub fn respond(&mut self, input: &str) -> Reply {
        let raw = input.trim().to_string();
        let lower = raw.to_lowercase();

        // A pending context intercepts the message and is consumed exactly
        // once, whether or not its handler finds a match.
        let reply = match self.context.take() {
            Some(Context::AwaitingCategoryConfirmation(hint)) => {
                self.confirm_category(hint, &raw, &lower)
            }
            Some(Context::AwaitingSellerSelection(sellers)) => {
                self.select_seller(&sellers, &raw, &lower)
            }
            Some(Context::AwaitingLocationInput) => self.locate(&raw, &lower),
            Some(Context::AwaitingCompareSelection(sellers)) => self.compare(&sellers, &lower),
            None => self.dispatch(&lower),
        };

        self.context = reply.context.clone();
        reply
    }

    fn dispatch(&mut self, lower: &str) -> Reply {
        match intent::detect(lower, self.directory.categories()) {
            Intent::Greeting => Reply::plain(
                "Hi! I'm Nest. I can list categories, rank sellers by rating or price, \
                 or find someone by name.",
                RECOVERY_CHIPS,
            ),
            Intent::ListServices => self.list_services(),
            Intent::ListCategories => self.list_categories(),
            Intent::Compare => self.start_compare(),
            Intent::TopRated => self.top_rated(),
            Intent::PriceQuery => self.cheapest(),
            Intent::Category(category) => self.category_results(&category),
            Intent::Location => self.ask_location(),
            Intent::SellerSearch(Some(name)) => self.search_seller(&name),
            Intent::SellerSearch(None) => self.ask_seller_name(),
            Intent::Help => Reply::plain(
                "Here's what I can do:\n\
                 • Show service categories\n\
                 • Rank sellers by rating or price\n\
                 • Find sellers by name or location\n\
                 • Compare 2-3 sellers side by side",
                &["Show categories", "Top rated sellers"],
            ),
            Intent::Thanks => Reply::plain(
                "Happy to help! Anything else?",
                &["Show categories", "Top rated sellers"],
            ),
            Intent::Goodbye => {
                Reply::plain("Good luck with your project! Come back any time.", &[])
            }
            Intent::Fallback => self.fallback(),
        }
    }

    fn fallback(&mut self) -> Reply {
        let hint = FALLBACK_HINTS[self.rng.gen_range(0..FALLBACK_HINTS.len())];
        Reply::plain(
            format!("Sorry, I didn't catch that. {}", hint),
            RECOVERY_CHIPS,
        )
    }

    fn list_services(&self) -> Reply {
        if self.directory.is_empty() {
            return Reply::plain("I don't have any sellers on file right now.", &["Help"]);
        }

        let mut text = format!(
            "We have {} sellers offering services in:\n",
            self.directory.len()
        );
        for category in self.directory.categories() {
            let count = self
                .directory
                .sellers()
                .iter()
                .filter(|s| s.category.eq_ignore_ascii_case(category))
                .count();
            text.push_str(&format!("• {} ({} sellers)\n", category, count));
        }
        text.push_str("Ask about any of them.");

        Reply::plain(text, &["Show categories", "Top rated sellers"])
    }

    fn list_categories(&self) -> Reply {
        if self.directory.categories().is_empty() {
            return Reply::plain("I don't have any categories on file right now.", &["Help"]);
        }

        let mut text = String::from("Here are our service categories:\n");
        for (i, category) in self.directory.categories().iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, category));
        }
        text.push_str("Which one should I look into?");

        let chips: Vec<String> = self
            .directory
            .categories()
            .iter()
            .take(4)
            .cloned()
            .collect();

        Reply {
            text,
            quick_replies: chips,
            context: Some(Context::AwaitingCategoryConfirmation(None)),
        }
    }

    fn start_compare(&self) -> Reply {
        let chips: Vec<String> = self
            .directory
            .sellers()
            .iter()
            .take(3)
            .map(|s| s.name.clone())
            .collect();

        Reply {
            text: "Sure — which sellers should I compare? Give me 2 or 3 names, like \
                   \"John's Plumbing and Acme Electric\"."
                .to_string(),
            quick_replies: chips,
            context: Some(Context::AwaitingCompareSelection(
                self.directory.sellers().to_vec(),
            )),
        }
    }

    fn top_rated(&self) -> Reply {
        let ranked = rank::top_rated(self.directory.sellers());
        if ranked.is_empty() {
            return Reply::plain("I don't have any sellers to rank yet.", &["Help"]);
        }

        let mut text = String::from("Here are our top rated sellers:\n");
        for seller in &ranked {
            text.push_str(&format!("• {}\n", rank::summary_line(seller)));
        }

        Reply::plain(text, &["Compare these", "Cheapest options"])
            .with_context(Context::AwaitingCompareSelection(ranked))
    }

    fn cheapest(&self) -> Reply {
        let ranked = rank::cheapest(self.directory.sellers());
        if ranked.is_empty() {
            return Reply::plain("I don't have any sellers to rank yet.", &["Help"]);
        }

        let mut text = String::from("Most affordable first:\n");
        for seller in &ranked {
            text.push_str(&format!("• {}\n", rank::summary_line(seller)));
        }

        Reply::plain(text, &["Compare these", "Top rated sellers"])
            .with_context(Context::AwaitingCompareSelection(ranked))
    }

    fn category_results(&self, category: &str) -> Reply {
        let matched = rank::by_category(self.directory.sellers(), category);
        if matched.is_empty() {
            return Reply::plain(
                format!("No sellers in {} yet. Want to browse something else?", category),
                &["Show categories", "Top rated sellers"],
            );
        }

        let mut text = format!("Top {} sellers:\n", category);
        for seller in &matched {
            text.push_str(&format!("• {}\n", rank::summary_line(seller)));
        }

        Reply::plain(text, &["Compare these", "Show categories"])
            .with_context(Context::AwaitingCompareSelection(matched))
    }

    fn ask_location(&self) -> Reply {
        let chips = self.directory.cities().into_iter().take(4).collect();
        Reply {
            text: "Which area are you in? Tell me a city or neighborhood.".to_string(),
            quick_replies: chips,
            context: Some(Context::AwaitingLocationInput),
        }
    }

    fn ask_seller_name(&self) -> Reply {
        let chips: Vec<String> = self
            .directory
            .sellers()
            .iter()
            .take(3)
            .map(|s| s.name.clone())
            .collect();

        Reply {
            text: "Who are you looking for? Give me a name, even part of one.".to_string(),
            quick_replies: chips,
            context: Some(Context::AwaitingSellerSelection(
                self.directory.sellers().to_vec(),
            )),
        }
    }

    fn search_seller(&self, name: &str) -> Reply {
        let matched = rank::by_name(self.directory.sellers(), name);
        if matched.is_empty() {
            // The "name" may actually be a category ("find plumb...").
            if let Some(category) = self.directory.resolve_category(name) {
                let category = category.clone();
                return Reply {
                    text: format!("I couldn't find a seller named \"{}\". Did you mean the {} category?", name, category),
                    quick_replies: vec!["Yes".to_string(), "Show categories".to_string()],
                    context: Some(Context::AwaitingCategoryConfirmation(Some(category))),
                };
            }
            return Reply::plain(
                format!("Sorry, I couldn't find a seller named \"{}\".", name),
                RECOVERY_CHIPS,
            );
        }

        let mut text = String::from("Here's what I found:\n");
        for seller in &matched {
            text.push_str(&format!("• {}\n", rank::summary_line(seller)));
        }

        let mut chips = vec!["Top rated sellers".to_string(), "Show categories".to_string()];
        if matched.len() >= 2 {
            chips.insert(0, "Compare these".to_string());
        }

        Reply {
            text,
            quick_replies: chips,
            context: Some(Context::AwaitingCompareSelection(matched)),
        }
    }

    // --- context handlers ------------------------------------------------

    fn confirm_category(&self, hint: Option<String>, raw: &str, lower: &str) -> Reply {
        let affirmed = matches!(lower, "yes" | "yeah" | "yep" | "sure" | "ok" | "okay" | "please");
        if affirmed {
            if let Some(category) = hint {
                return self.category_results(&category);
            }
        }

        match self.directory.resolve_category(lower) {
            Some(category) => {
                let category = category.clone();
                self.category_results(&category)
            }
            None => Reply::plain(
                format!("I don't have a category matching \"{}\". Here's what we cover instead.", raw),
                &["Show categories", "Top rated sellers"],
            ),
        }
    }

    fn select_seller(&self, sellers: &[Seller], raw: &str, lower: &str) -> Reply {
        let matched = rank::by_name(sellers, lower);
        match matched.len() {
            0 => Reply::plain(
                format!("Sorry, I couldn't find a seller named \"{}\".", raw),
                RECOVERY_CHIPS,
            ),
            1 => Reply::plain(rank::seller_card(&matched[0]), &["Top rated sellers"]),
            _ => {
                let mut text = String::from("A few sellers match:\n");
                for seller in &matched {
                    text.push_str(&format!("• {}\n", rank::summary_line(seller)));
                }
                Reply::plain(text, &["Compare these"])
                    .with_context(Context::AwaitingCompareSelection(matched))
            }
        }
    }

    fn locate(&self, raw: &str, lower: &str) -> Reply {
        let groups = rank::by_location(self.directory.sellers(), lower);
        if groups.is_empty() {
            return Reply::plain(
                format!("I couldn't find any services in {} yet. Want to try another area?", raw),
                &["Show categories", "Top rated sellers"],
            );
        }

        let mut text = format!("Here's what's available around {}:\n", raw);
        for (category, sellers) in &groups {
            let names: Vec<&str> = sellers.iter().map(|s| s.name.as_str()).collect();
            text.push_str(&format!("• {}: {}\n", category, names.join(", ")));
        }

        Reply::plain(text, &["Top rated sellers", "Compare sellers"])
    }

    fn compare(&self, sellers: &[Seller], lower: &str) -> Reply {
        let wants_all = lower == "compare"
            || lower
                .split_whitespace()
                .any(|w| matches!(w, "these" | "all" | "everything"));
        let chosen: Vec<Seller> = if wants_all {
            sellers.iter().take(rank::COMPARE_LIMIT).cloned().collect()
        } else {
            resolve_compare_names(sellers, lower)
        };

        Reply::plain(
            rank::render_comparison(&chosen),
            &["Top rated sellers", "Show categories"],
        )
    }
}

/// Split "a and b", "a, b, c", "a vs b" into parts and containment-match
/// each against the candidate list. Duplicates collapse; at most 3 survive.
fn resolve_compare_names(candidates: &[Seller], input: &str) -> Vec<Seller> {
    let normalized = input
        .replace(" versus ", ",")
        .replace(" vs ", ",")
        .replace(" and ", ",");

    let mut chosen: Vec<Seller> = Vec::new();
    for part in normalized.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(seller) = rank::by_name(candidates, part).into_iter().next() {
            if !chosen.iter().any(|s| s.id == seller.id) {
                chosen.push(seller);
            }
        }
    }

    chosen.truncate(rank::COMPARE_LIMIT);
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seller::Price;

    fn seller(name: &str, category: &str, city: &str, rating: Option<f64>) -> Seller {
        Seller {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            category: category.to_string(),
            city: city.to_string(),
            address: "1 Main St".to_string(),
            service: "General work".to_string(),
            rating,
            price: Some(Price::Number(50.0)),
        }
    }

    fn engine() -> ChatEngine {
        ChatEngine::with_seed(
            SellerDirectory::from_sellers(vec![
                seller("John Smith", "Electrician", "Springfield", Some(4.5)),
                seller("Jane", "Plumbing", "Springfield", Some(4.9)),
                seller("Acme Electric", "Electrician", "Shelbyville", None),
            ]),
            7,
        )
    }

    #[test]
    fn category_listing_lists_all_and_sets_confirmation_context() {
        let mut engine = engine();
        let reply = engine.respond("show me the categories");

        assert!(reply.text.contains("Electrician"));
        assert!(reply.text.contains("Plumbing"));
        assert!(matches!(
            engine.context(),
            Some(Context::AwaitingCategoryConfirmation(None))
        ));
    }

    #[test]
    fn name_search_returns_only_matches_and_sets_compare_context() {
        let mut engine = engine();
        let reply = engine.respond("find john");

        assert!(reply.text.contains("John Smith"));
        assert!(!reply.text.contains("Jane"));
        match engine.context() {
            Some(Context::AwaitingCompareSelection(sellers)) => {
                assert_eq!(sellers.len(), 1);
                assert_eq!(sellers[0].name, "John Smith");
            }
            other => panic!("unexpected context: {:?}", other),
        }
    }

    #[test]
    fn location_search_with_no_match_reports_and_clears_context() {
        let mut engine = engine();
        engine.respond("anyone near me?");
        assert!(matches!(
            engine.context(),
            Some(Context::AwaitingLocationInput)
        ));

        let reply = engine.respond("Boston");
        assert!(reply.text.contains("couldn't find any services in Boston"));
        assert!(engine.context().is_none());
    }

    #[test]
    fn location_search_groups_results_by_category() {
        let mut engine = engine();
        engine.respond("anyone nearby?");
        let reply = engine.respond("Springfield");

        assert!(reply.text.contains("Electrician: John Smith"));
        assert!(reply.text.contains("Plumbing: Jane"));
    }

    #[test]
    fn context_is_consumed_even_when_the_handler_finds_nothing() {
        let mut engine = engine();
        engine.respond("find a seller");
        assert!(matches!(
            engine.context(),
            Some(Context::AwaitingSellerSelection(_))
        ));

        let reply = engine.respond("zzz nobody");
        assert!(reply.text.contains("couldn't find"));
        assert!(engine.context().is_none());

        // The next message goes through normal intent matching again.
        let reply = engine.respond("hello");
        assert!(reply.text.contains("I'm Nest"));
    }

    #[test]
    fn top_rated_reply_carries_ranked_sellers_for_comparison() {
        let mut engine = engine();
        let reply = engine.respond("who are the best sellers?");
        assert!(reply.text.contains("Jane"));

        match engine.context() {
            Some(Context::AwaitingCompareSelection(sellers)) => {
                assert_eq!(sellers[0].name, "Jane");
                assert!(sellers.len() <= 5);
            }
            other => panic!("unexpected context: {:?}", other),
        }
    }

    #[test]
    fn compare_selection_resolves_names_and_renders_blocks() {
        let mut engine = engine();
        engine.respond("compare sellers");
        let reply = engine.respond("John Smith and Acme");

        assert_eq!(reply.text.matches("Category:").count(), 2);
        assert!(reply.text.contains("John Smith"));
        assert!(reply.text.contains("Acme Electric"));
        assert!(engine.context().is_none());
    }

    #[test]
    fn compare_selection_with_one_name_refuses() {
        let mut engine = engine();
        engine.respond("compare sellers");
        let reply = engine.respond("Jane");
        assert!(reply.text.contains("at least 2"));
    }

    #[test]
    fn did_you_mean_category_roundtrip() {
        let mut engine = engine();
        let reply = engine.respond("find plumb");
        assert!(reply.text.contains("Did you mean the Plumbing category?"));
        assert!(matches!(
            engine.context(),
            Some(Context::AwaitingCategoryConfirmation(Some(_)))
        ));

        let reply = engine.respond("yes");
        assert!(reply.text.contains("Jane"));
        assert!(matches!(
            engine.context(),
            Some(Context::AwaitingCompareSelection(_))
        ));
    }

    #[test]
    fn fallback_hint_is_deterministic_under_a_seed() {
        let dir = || {
            SellerDirectory::from_sellers(vec![seller(
                "John Smith",
                "Electrician",
                "Springfield",
                Some(4.5),
            )])
        };
        let mut a = ChatEngine::with_seed(dir(), 42);
        let mut b = ChatEngine::with_seed(dir(), 42);

        assert_eq!(a.respond("qwerty").text, b.respond("qwerty").text);
        assert!(a.respond("asdf").text.starts_with("Sorry, I didn't catch that."));
    }

    #[test]
    fn typing_delay_is_bounded_and_deterministic_under_a_seed() {
        let mut a = ChatEngine::with_seed(SellerDirectory::new(), 9);
        let mut b = ChatEngine::with_seed(SellerDirectory::new(), 9);
        for _ in 0..20 {
            let delay = a.typing_delay_ms();
            assert!((800..=1500).contains(&delay));
            assert_eq!(delay, b.typing_delay_ms());
        }
    }

    #[test]
    fn greeting_wins_over_help_in_priority_order() {
        let mut engine = engine();
        let reply = engine.respond("hi, can you help me?");
        assert!(reply.text.contains("I'm Nest"));
    }
}
